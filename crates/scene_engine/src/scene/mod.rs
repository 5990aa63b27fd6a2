//! Scene graph
//!
//! Nodes live in an arena owned by [`SceneGraph`] and are addressed by [`NodeId`].
//! A node's `children` list is the owning relation of the hierarchy; the `parent`
//! link is a plain back reference. Components live in a second arena and are
//! attached to at most one node at a time.

pub mod component;
pub mod error;
pub mod graph;
pub mod node;
pub mod serialization;

mod dispatch;

pub use component::{
    CameraComponent, Component, ComponentData, ComponentKind, CustomComponent, LightComponent,
    LightKind, MaterialComponent, MeshComponent, TransformComponent,
};
pub use error::{SceneError, SceneResult};
pub use graph::{Branch, SceneGraph};
pub use node::{ComponentId, Node, NodeId};
pub use serialization::{ComponentGroup, NodeRecord};
