//! The scene graph arena and its hierarchy operations

use std::collections::BTreeMap;

use slotmap::SlotMap;

use super::{
    CameraComponent, Component, ComponentData, ComponentId, ComponentKind, LightComponent, Node,
    NodeId, SceneError, SceneResult, TransformComponent,
};
use crate::events::{Event, EventPayload, EventType};
use crate::foundation::math::Mat4;

/// Owner of all nodes and components of one or more scene trees
///
/// All mutation goes through this type so that the hierarchy invariants hold at
/// all times: a node is never its own ancestor and appears in at most one
/// parent's children.
#[derive(Debug, Default)]
pub struct SceneGraph {
    pub(super) nodes: SlotMap<NodeId, Node>,
    pub(super) components: SlotMap<ComponentId, Component>,
}

impl SceneGraph {
    /// Create an empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    // #region Nodes

    /// Create a detached node with the given name
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        let id = self.nodes.insert(Node::new(name));
        log::trace!("Created node {:?} '{}'", id, self.nodes[id].name);
        id
    }

    /// True if the handle refers to a live node
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Read access to a node
    pub fn node(&self, node: NodeId) -> SceneResult<&Node> {
        self.nodes.get(node).ok_or(SceneError::NodeNotFound(node))
    }

    pub(super) fn node_mut(&mut self, node: NodeId) -> SceneResult<&mut Node> {
        self.nodes.get_mut(node).ok_or(SceneError::NodeNotFound(node))
    }

    /// Name of a node
    pub fn name(&self, node: NodeId) -> SceneResult<&str> {
        Ok(&self.node(node)?.name)
    }

    /// Rename a node
    pub fn set_name(&mut self, node: NodeId, name: impl Into<String>) -> SceneResult<()> {
        self.node_mut(node)?.name = name.into();
        Ok(())
    }

    /// Parent of a node, `None` for roots, detached and stale nodes
    pub fn get_parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    /// Topmost ancestor of a node, the node itself if it has no parent
    pub fn get_ancestor(&self, node: NodeId) -> NodeId {
        let mut ancestor = node;
        while let Some(parent) = self.get_parent(ancestor) {
            ancestor = parent;
        }
        ancestor
    }

    /// True if `ancestor` is `node` or any node above it
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get_parent(id);
        }
        false
    }

    /// True if `node` sits somewhere below `ancestor`
    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        node != ancestor && self.is_ancestor_or_self(ancestor, node)
    }

    /// Path from the topmost ancestor down to `node`, both included
    pub fn get_path(&self, node: NodeId) -> Vec<NodeId> {
        if !self.contains(node) {
            return Vec::new();
        }
        let mut path = vec![node];
        let mut current = node;
        while let Some(parent) = self.get_parent(current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Child at `index`, `None` if out of range
    pub fn get_child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.nodes.get(node)?.children.get(index).copied()
    }

    /// Number of direct children, 0 for a stale handle
    pub fn child_count(&self, node: NodeId) -> usize {
        self.nodes.get(node).map_or(0, |n| n.children.len())
    }

    /// Copy of the list of children
    pub fn get_children(&self, node: NodeId) -> SceneResult<Vec<NodeId>> {
        Ok(self.node(node)?.children.clone())
    }

    /// Direct children carrying the given name
    pub fn get_children_by_name(&self, node: NodeId, name: &str) -> SceneResult<Vec<NodeId>> {
        Ok(self
            .node(node)?
            .children
            .iter()
            .copied()
            .filter(|child| self.nodes.get(*child).is_some_and(|c| c.name == name))
            .collect())
    }

    /// Position of `child` in the children of `parent`
    pub fn find_child(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.nodes.get(parent)?.children.iter().position(|c| *c == child)
    }

    /// Append `child` to the children of `parent`
    ///
    /// Does nothing if `child` already is a direct child. A node attached
    /// elsewhere is removed from its current parent first. Fires a bubbling
    /// [`EventType::ChildAppend`] at the child once it is attached.
    ///
    /// # Errors
    /// [`SceneError::CyclicHierarchy`] if `child` is `parent` or one of its ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        self.node(child)?;
        if self.node(parent)?.children.contains(&child) {
            return Ok(());
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(SceneError::CyclicHierarchy { node: child, parent });
        }

        if let Some(previous) = self.get_parent(child) {
            self.remove_child(previous, child)?;
        }
        // a handler of the removal may have attached the child somewhere else
        if let Some(previous) = self.get_parent(child) {
            self.remove_child(previous, child)?;
        }

        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        log::trace!("Appended {:?} to {:?}", child, parent);

        self.dispatch_event(child, &child_event(EventType::ChildAppend, child))
    }

    /// Remove `child` from the children of `parent`
    ///
    /// Does nothing if `child` is not a direct child. Fires a bubbling
    /// [`EventType::ChildRemove`] at the child while it is still attached.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        if self.find_child(parent, child).is_none() {
            return Ok(());
        }

        self.dispatch_event(child, &child_event(EventType::ChildRemove, child))?;

        // handlers may have restructured the tree, look again
        let Some(found) = self.find_child(parent, child) else {
            return Ok(());
        };
        self.node_mut(parent)?.children.remove(found);
        self.node_mut(child)?.parent = None;
        log::trace!("Removed {:?} from {:?}", child, parent);
        Ok(())
    }

    /// Remove all children of `node`, one [`remove_child`](Self::remove_child) each
    ///
    /// Children are removed from the front. Stops at the first handler error.
    pub fn remove_all_children(&mut self, node: NodeId) -> SceneResult<()> {
        while let Some(first) = self.get_child(node, 0) {
            self.remove_child(node, first)?;
            if self.get_child(node, 0) == Some(first) {
                // a handler put it back, do not spin
                break;
            }
        }
        Ok(())
    }

    /// Replace `old` with `new` at the same position in the children of `parent`
    ///
    /// Returns `Ok(false)` if `old` is not a child of `parent`. If `new` has a
    /// parent it is removed from there first. `old` loses its parent before `new`
    /// gains one, so no node ever has two parents.
    ///
    /// # Errors
    /// [`SceneError::CyclicHierarchy`] if `new` is `parent` or one of its ancestors.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) -> SceneResult<bool> {
        self.node(new)?;
        if self.find_child(parent, old).is_none() {
            return Ok(false);
        }
        if old == new {
            return Ok(true);
        }
        if self.is_ancestor_or_self(new, parent) {
            return Err(SceneError::CyclicHierarchy { node: new, parent });
        }

        if let Some(previous) = self.get_parent(new) {
            self.remove_child(previous, new)?;
        }
        self.dispatch_event(old, &child_event(EventType::ChildRemove, old))?;

        let Some(found) = self.find_child(parent, old) else {
            return Ok(false);
        };
        self.node_mut(old)?.parent = None;
        self.node_mut(parent)?.children[found] = new;
        self.node_mut(new)?.parent = Some(parent);
        log::trace!("Replaced {:?} with {:?} in {:?}", old, new, parent);

        self.dispatch_event(new, &child_event(EventType::ChildAppend, new))?;
        Ok(true)
    }

    /// Depth-first, pre-order iteration over `root` and all its descendants
    ///
    /// The iterator borrows the graph, so the tree cannot change while it runs.
    /// Use [`branch_ids`](Self::branch_ids) for a snapshot that can be held across mutation.
    pub fn branch(&self, root: NodeId) -> Branch<'_> {
        let stack = if self.contains(root) { vec![root] } else { Vec::new() };
        Branch { graph: self, stack, active_only: false }
    }

    /// Like [`branch`](Self::branch), but skips inactive nodes and everything below them
    ///
    /// Yields nothing if `root` itself is inactive.
    pub fn branch_active(&self, root: NodeId) -> Branch<'_> {
        Branch { active_only: true, ..self.branch(root) }
    }

    /// Snapshot of [`branch`](Self::branch)
    pub fn branch_ids(&self, root: NodeId) -> Vec<NodeId> {
        self.branch(root).collect()
    }

    /// Switch a node active or inactive
    ///
    /// Fires a non-bubbling [`EventType::NodeActivate`] or
    /// [`EventType::NodeDeactivate`] at the node, also when the flag did not change.
    pub fn activate(&mut self, node: NodeId, on: bool) -> SceneResult<()> {
        self.node_mut(node)?.active = on;
        log::trace!("Node {:?} active: {}", node, on);
        let event_type = if on { EventType::NodeActivate } else { EventType::NodeDeactivate };
        self.dispatch_event(node, &Event::new(event_type))
    }

    /// Active flag of a node, false for a stale handle
    pub fn is_active(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(Node::is_active)
    }

    /// Detach `root` from its parent and drop it with all descendants and their components
    pub fn remove_branch(&mut self, root: NodeId) -> SceneResult<()> {
        if let Some(parent) = self.get_parent(root) {
            self.remove_child(parent, root)?;
        }
        self.drop_branch(root);
        Ok(())
    }

    /// Drop a branch without firing any event
    ///
    /// Unlinks `root` from its parent silently. Used to roll back a partially
    /// rebuilt branch, whose listeners must not see a removal.
    pub(super) fn discard_branch(&mut self, root: NodeId) {
        if let Some(parent) = self.get_parent(root).and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|child| *child != root);
        }
        self.drop_branch(root);
    }

    fn drop_branch(&mut self, root: NodeId) {
        for node in self.branch_ids(root) {
            if let Some(removed) = self.nodes.remove(node) {
                for (_, ids) in removed.components {
                    for id in ids {
                        self.components.remove(id);
                    }
                }
            }
        }
        log::trace!("Dropped branch {:?}", root);
    }

    /// Recompute world matrices of the branch below `root`, pre-order
    ///
    /// A node's world matrix is its parent's world matrix times its transform
    /// component (identity without one). The root starts from its parent's cached
    /// world matrix. Nodes already stamped with `timestamp` keep their matrix.
    pub fn update_world_transforms(&mut self, root: NodeId, timestamp: u64) -> SceneResult<()> {
        let start = self
            .get_parent(root)
            .and_then(|parent| self.nodes.get(parent))
            .map_or_else(Mat4::identity, |parent| parent.mtx_world);
        self.node(root)?;

        let mut stack = vec![(root, start)];
        while let Some((id, parent_world)) = stack.pop() {
            let local = self.transform_of(id).map_or_else(Mat4::identity, |t| t.local);
            let node = self.node_mut(id)?;
            if !node.is_updated(timestamp) {
                node.mtx_world = parent_world * local;
                node.timestamp_update = timestamp;
            }
            let world = node.mtx_world;
            stack.extend(node.children.iter().rev().map(|child| (*child, world)));
        }
        Ok(())
    }

    // #endregion

    // #region Components

    /// Put a component into the arena, detached
    pub fn create_component(&mut self, data: ComponentData) -> ComponentId {
        self.components.insert(Component::new(data))
    }

    /// Read access to a component
    pub fn component(&self, component: ComponentId) -> SceneResult<&Component> {
        self.components.get(component).ok_or(SceneError::ComponentNotFound(component))
    }

    /// Number of components in the arena, attached or not
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Camera data of a component, `None` for other kinds
    pub fn camera(&self, component: ComponentId) -> Option<&CameraComponent> {
        match self.components.get(component)?.data() {
            ComponentData::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    /// Mutable camera data of a component, `None` for other kinds
    pub fn camera_mut(&mut self, component: ComponentId) -> Option<&mut CameraComponent> {
        match self.components.get_mut(component)?.data_mut() {
            ComponentData::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    /// Light data of a component, `None` for other kinds
    pub fn light(&self, component: ComponentId) -> Option<&LightComponent> {
        match self.components.get(component)?.data() {
            ComponentData::Light(light) => Some(light),
            _ => None,
        }
    }

    /// Mutable light data of a component, `None` for other kinds
    pub fn light_mut(&mut self, component: ComponentId) -> Option<&mut LightComponent> {
        match self.components.get_mut(component)?.data_mut() {
            ComponentData::Light(light) => Some(light),
            _ => None,
        }
    }

    /// Mutable transform data of a component, `None` for other kinds
    pub fn transform_mut(&mut self, component: ComponentId) -> Option<&mut TransformComponent> {
        match self.components.get_mut(component)?.data_mut() {
            ComponentData::Transform(transform) => Some(transform),
            _ => None,
        }
    }

    /// Mutable properties of a custom component, `None` for other kinds
    ///
    /// The type name and the singleton flag stay fixed: they decide where the
    /// component is grouped on its node.
    pub fn custom_properties_mut(
        &mut self,
        component: ComponentId,
    ) -> Option<&mut BTreeMap<String, String>> {
        match self.components.get_mut(component)?.data_mut() {
            ComponentData::Custom(custom) => Some(&mut custom.properties),
            _ => None,
        }
    }

    /// First transform component of a node
    pub fn transform_of(&self, node: NodeId) -> Option<&TransformComponent> {
        let id = self.get_component(node, &ComponentKind::Transform)?;
        match self.components.get(id)?.data() {
            ComponentData::Transform(transform) => Some(transform),
            _ => None,
        }
    }

    /// Components of the given kind attached to a node, in attach order
    pub fn get_components(&self, node: NodeId, kind: &ComponentKind) -> Vec<ComponentId> {
        self.nodes
            .get(node)
            .and_then(|n| n.components_of(kind))
            .cloned()
            .unwrap_or_default()
    }

    /// First component of the given kind attached to a node
    pub fn get_component(&self, node: NodeId, kind: &ComponentKind) -> Option<ComponentId> {
        self.nodes.get(node)?.components_of(kind)?.first().copied()
    }

    /// All components attached to a node, grouped by kind in first-attach order
    pub fn get_all_components(&self, node: NodeId) -> Vec<ComponentId> {
        self.nodes
            .get(node)
            .map(|n| n.components.iter().flat_map(|(_, ids)| ids.iter().copied()).collect())
            .unwrap_or_default()
    }

    /// Attach a component to a node
    ///
    /// Does nothing if the component is already attached to this node. A component
    /// attached to another node is detached from there first. Fires a non-bubbling
    /// [`EventType::ComponentAdd`] at the node after attaching.
    ///
    /// # Errors
    /// [`SceneError::SingletonViolation`] if the component's kind is a singleton and
    /// the node already has one.
    pub fn add_component(&mut self, node: NodeId, component: ComponentId) -> SceneResult<()> {
        self.node(node)?;
        let entry = self.component(component)?;
        if entry.container() == Some(node) {
            return Ok(());
        }
        let kind = entry.kind();
        let singleton = entry.data().is_singleton();
        let previous = entry.container();

        if singleton && self.node(node)?.components_of(&kind).is_some_and(|ids| !ids.is_empty()) {
            return Err(SceneError::SingletonViolation { kind, node });
        }
        if let Some(previous) = previous {
            self.remove_component(previous, component)?;
        }

        let target = self.node_mut(node)?;
        match target.components_of_mut(&kind) {
            Some(ids) => ids.push(component),
            None => target.components.push((kind.clone(), vec![component])),
        }
        if let Some(entry) = self.components.get_mut(component) {
            entry.set_container(Some(node));
        }
        log::trace!("Attached {:?} component {:?} to {:?}", kind, component, node);

        self.dispatch_event(node, &component_event(EventType::ComponentAdd, component, kind))
    }

    /// Detach a component from a node
    ///
    /// Returns `Ok(false)` and does nothing if the component is not attached to
    /// this node. Otherwise clears the component's container and fires a
    /// non-bubbling [`EventType::ComponentRemove`] at the node.
    pub fn remove_component(&mut self, node: NodeId, component: ComponentId) -> SceneResult<bool> {
        let Some(kind) = self.components.get(component).map(Component::kind) else {
            return Ok(false);
        };
        let target = self.node_mut(node)?;
        let Some(ids) = target.components_of_mut(&kind) else {
            return Ok(false);
        };
        let Some(found) = ids.iter().position(|id| *id == component) else {
            return Ok(false);
        };
        ids.remove(found);
        if ids.is_empty() {
            target.components.retain(|(k, _)| *k != kind);
        }
        if let Some(entry) = self.components.get_mut(component) {
            entry.set_container(None);
        }
        log::trace!("Detached {:?} component {:?} from {:?}", kind, component, node);

        self.dispatch_event(node, &component_event(EventType::ComponentRemove, component, kind))?;
        Ok(true)
    }

    /// Drop a component from the arena, detaching it first
    pub fn destroy_component(&mut self, component: ComponentId) -> SceneResult<()> {
        if let Some(container) = self.component(component)?.container() {
            self.remove_component(container, component)?;
        }
        self.components.remove(component);
        Ok(())
    }

    // #endregion
}

/// Bubbling hierarchy event about `child`
fn child_event(event_type: EventType, child: NodeId) -> Event {
    Event::bubbling(event_type).with_payload(EventPayload::Child(child))
}

/// Non-bubbling event about a component attached to or detached from a node
fn component_event(event_type: EventType, component: ComponentId, kind: ComponentKind) -> Event {
    Event::new(event_type).with_payload(EventPayload::Component { component, kind })
}

/// Pre-order iterator over a branch, see [`SceneGraph::branch`]
#[derive(Debug)]
pub struct Branch<'a> {
    graph: &'a SceneGraph,
    stack: Vec<NodeId>,
    active_only: bool,
}

impl Iterator for Branch<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.stack.pop()?;
            match self.graph.nodes.get(id) {
                Some(node) if self.active_only && !node.active => continue,
                Some(node) => self.stack.extend(node.children.iter().rev()),
                None => {}
            }
            return Some(id);
        }
    }
}
