//! Persisted form of a branch
//!
//! A [`NodeRecord`] holds a node's name and active flag, its components grouped by kind in
//! first-attach order, and the records of its children in order. Reading a record
//! back attaches the components before appending children, so listeners reacting
//! to child appends see a fully equipped parent.

use serde::{Deserialize, Serialize};

use super::{ComponentData, ComponentKind, NodeId, SceneError, SceneGraph, SceneResult};
use crate::events::{Event, EventType};

/// Components of one kind in a [`NodeRecord`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentGroup {
    /// Kind shared by all components of the group
    pub kind: ComponentKind,
    /// Component data in attach order
    pub components: Vec<ComponentData>,
}

/// Serialized node and its descendants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node name
    pub name: String,
    /// Active flag, true when missing
    #[serde(default = "default_active")]
    pub active: bool,
    /// Component groups in first-attach order
    #[serde(default)]
    pub components: Vec<ComponentGroup>,
    /// Child records in child order
    #[serde(default)]
    pub children: Vec<NodeRecord>,
}

fn default_active() -> bool {
    true
}

impl Default for NodeRecord {
    fn default() -> Self {
        Self { name: String::new(), active: true, components: Vec::new(), children: Vec::new() }
    }
}

impl NodeRecord {
    /// Write the record as pretty printed RON
    pub fn to_ron(&self) -> SceneResult<String> {
        ron::ser::to_string_pretty(self, Default::default())
            .map_err(|e| SceneError::Serialization(e.to_string()))
    }

    /// Read a record from RON text
    pub fn from_ron(text: &str) -> SceneResult<Self> {
        ron::from_str(text).map_err(|e| SceneError::Serialization(e.to_string()))
    }

    /// Number of records in this branch, this one included
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(NodeRecord::count).sum::<usize>()
    }
}

impl SceneGraph {
    /// Build the record of `node` and its descendants
    ///
    /// Fires a bubbling [`EventType::NodeSerialized`] at every node once its
    /// record is complete, children before their parent.
    pub fn serialize_node(&mut self, node: NodeId) -> SceneResult<NodeRecord> {
        let source = self.node(node)?;
        let name = source.name.clone();
        let active = source.active;
        let children = source.children.clone();
        let mut components = Vec::with_capacity(source.components.len());
        for (kind, ids) in &source.components {
            let data = ids
                .iter()
                .map(|id| self.component(*id).map(|c| c.data().clone()))
                .collect::<SceneResult<Vec<_>>>()?;
            components.push(ComponentGroup { kind: kind.clone(), components: data });
        }

        let children = children
            .into_iter()
            .map(|child| self.serialize_node(child))
            .collect::<SceneResult<Vec<_>>>()?;

        self.dispatch_event(node, &Event::bubbling(EventType::NodeSerialized))?;
        Ok(NodeRecord { name, active, components, children })
    }

    /// Rebuild a detached branch from a record and return its root
    ///
    /// Components are attached before children are appended. Fires a bubbling
    /// [`EventType::NodeDeserialized`] at every rebuilt node once its branch is
    /// complete. On error every node and component created so far is dropped
    /// again, so the graph holds no remains of the failed record.
    ///
    /// # Errors
    /// - [`SceneError::Serialization`] if a group holds data of another kind
    /// - [`SceneError::SingletonViolation`] if a group holds more than one
    ///   component of a singleton kind
    pub fn deserialize_node(&mut self, record: &NodeRecord) -> SceneResult<NodeId> {
        let node = self.create_node(record.name.clone());
        if let Err(error) = self.fill_node(node, record) {
            log::debug!("Discarding partially rebuilt '{}': {}", record.name, error);
            self.discard_branch(node);
            return Err(error);
        }
        Ok(node)
    }

    fn fill_node(&mut self, node: NodeId, record: &NodeRecord) -> SceneResult<()> {
        self.node_mut(node)?.active = record.active;
        for group in &record.components {
            for data in &group.components {
                if data.kind() != group.kind {
                    return Err(SceneError::Serialization(format!(
                        "{} component in a {} group",
                        data.kind(),
                        group.kind
                    )));
                }
                let component = self.create_component(data.clone());
                if let Err(error) = self.add_component(node, component) {
                    if self.components.get(component).is_some_and(|c| c.container().is_none()) {
                        self.components.remove(component);
                    }
                    return Err(error);
                }
            }
        }
        for child_record in &record.children {
            let child = self.deserialize_node(child_record)?;
            if let Err(error) = self.append_child(node, child) {
                if self.get_parent(child).is_none() {
                    self.discard_branch(child);
                }
                return Err(error);
            }
        }
        self.dispatch_event(node, &Event::bubbling(EventType::NodeDeserialized))
    }
}
