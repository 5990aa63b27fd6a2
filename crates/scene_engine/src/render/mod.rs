//! Rendering side of the scene: viewports and the services they draw through
//!
//! A [`Viewport`] binds a branch of the scene graph and a camera to a [`Canvas`]
//! and draws through a [`RenderBackend`]. Both services are traits so the
//! graphics API stays outside this crate.

pub mod backend;
pub mod focus;
pub mod input;
pub mod viewport;

#[cfg(test)]
mod viewport_tests;

pub use backend::{Canvas, LightIndex, RenderBackend, SurfaceHandle};
pub use focus::FocusSlot;
pub use input::{InputActivation, KeyboardData, NativeInput, PointerData, WheelData};
pub use viewport::{collect_lights, Viewport, ViewportError, ViewportId, ViewportResult};
