//! # Scene Engine
//!
//! Scene graph and viewport core of a real-time 3D engine.
//!
//! ## Features
//!
//! - **Scene Graph**: Arena-backed node tree with typed components
//! - **Structural Events**: Capture, target and bubble dispatch plus branch broadcasts
//! - **Serialization**: Branches persist as RON node records
//! - **Viewports**: Four stage frame pipeline from client area to render surface
//! - **Backend Agnostic**: Render back end and canvas are traits
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_engine::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let mut scene = SceneGraph::new();
//!     let root = scene.create_node("Root");
//!     let lamp = scene.create_node("Lamp");
//!     scene.append_child(root, lamp)?;
//!
//!     let light = LightComponent::new(LightKind::Point, Color::WHITE);
//!     let light = scene.create_component(ComponentData::Light(light));
//!     scene.add_component(lamp, light)?;
//!
//!     let record = scene.serialize_node(root)?;
//!     let copy = scene.deserialize_node(&NodeRecord::from_ron(&record.to_ron()?)?)?;
//!     assert_eq!(scene.branch(copy).count(), 2);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod events;
pub mod foundation;
pub mod framing;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, ViewportConfig},
        events::{Event, EventContext, EventPayload, EventType, Listener, Phase},
        foundation::{
            color::Color,
            math::{Mat4, Vec2, Vec3},
        },
        framing::{AxisFraming, Border, Extent, Framing, Rectangle},
        render::{
            Canvas, FocusSlot, InputActivation, NativeInput, RenderBackend, Viewport,
            ViewportError,
        },
        scene::{
            CameraComponent, ComponentData, ComponentId, ComponentKind, LightComponent, LightKind,
            NodeId, NodeRecord, SceneError, SceneGraph, TransformComponent,
        },
    };
}
