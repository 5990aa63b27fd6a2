//! Node data stored in the scene graph arena

use slotmap::new_key_type;

use super::ComponentKind;
use crate::events::ListenerTable;
use crate::foundation::math::Mat4;

new_key_type! {
    /// Stable handle of a node in a [`SceneGraph`](super::SceneGraph)
    pub struct NodeId;

    /// Stable handle of a component in a [`SceneGraph`](super::SceneGraph)
    pub struct ComponentId;
}

/// An element of the scene tree
///
/// Nodes are created and mutated through [`SceneGraph`](super::SceneGraph);
/// this type only exposes read access to their state.
#[derive(Debug, Clone)]
pub struct Node {
    /// Display name, not unique
    pub name: String,
    /// World transform computed by the last transform update
    pub mtx_world: Mat4,
    /// Timestamp of the last transform update that processed this node
    pub timestamp_update: u64,

    pub(super) active: bool,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
    pub(super) components: Vec<(ComponentKind, Vec<ComponentId>)>,
    pub(super) listeners: ListenerTable,
}

impl Node {
    pub(super) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mtx_world: Mat4::identity(),
            timestamp_update: 0,
            active: true,
            parent: None,
            children: Vec::new(),
            components: Vec::new(),
            listeners: ListenerTable::default(),
        }
    }

    /// False if the node and its branch are excluded from active iteration
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Parent node, `None` for a root or detached node
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in append order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// True if the last transform update carried the given timestamp
    pub fn is_updated(&self, timestamp_update: u64) -> bool {
        self.timestamp_update == timestamp_update
    }

    /// Registered handlers
    pub fn listeners(&self) -> &ListenerTable {
        &self.listeners
    }

    pub(super) fn components_of(&self, kind: &ComponentKind) -> Option<&Vec<ComponentId>> {
        self.components.iter().find(|(k, _)| k == kind).map(|(_, ids)| ids)
    }

    pub(super) fn components_of_mut(
        &mut self,
        kind: &ComponentKind,
    ) -> Option<&mut Vec<ComponentId>> {
        self.components
            .iter_mut()
            .find(|(k, _)| k == kind)
            .map(|(_, ids)| ids)
    }

    /// Kinds of the attached components, in the order they were first attached
    pub fn component_kinds(&self) -> impl Iterator<Item = &ComponentKind> {
        self.components.iter().map(|(kind, _)| kind)
    }
}
