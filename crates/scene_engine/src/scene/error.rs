//! Scene graph errors

use super::{ComponentId, ComponentKind, NodeId};

/// Result type for scene graph operations
pub type SceneResult<T> = Result<T, SceneError>;

/// Errors raised by structural operations on the scene graph
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Appending would make a node its own ancestor
    #[error("cyclic reference prohibited in node hierarchy: {node:?} is an ancestor of {parent:?}")]
    CyclicHierarchy {
        /// Node that was to be appended
        node: NodeId,
        /// Prospective parent
        parent: NodeId,
    },

    /// A singleton component kind already has an instance on the node
    #[error("component of kind {kind:?} is marked singleton and already attached to {node:?}")]
    SingletonViolation {
        /// Kind of the rejected component
        kind: ComponentKind,
        /// Node the component was to be attached to
        node: NodeId,
    },

    /// Handle does not refer to a live node
    #[error("node {0:?} does not exist")]
    NodeNotFound(NodeId),

    /// Handle does not refer to a live component
    #[error("component {0:?} does not exist")]
    ComponentNotFound(ComponentId),

    /// An event handler aborted a traversal
    #[error("event handler failed: {0}")]
    Handler(String),

    /// Writing or reading a node record failed
    #[error("serialization error: {0}")]
    Serialization(String),
}
