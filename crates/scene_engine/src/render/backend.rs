//! Interfaces of the services a viewport draws through
//!
//! The render back end rasterizes branches into an offscreen buffer that is
//! shared by every viewport drawing through it. The canvas is the visible
//! surface a viewport blits its part of that buffer into.

use std::collections::BTreeMap;

use crate::foundation::color::Color;
use crate::framing::Rectangle;
use crate::scene::{CameraComponent, ComponentId, LightKind, NodeId, SceneGraph};

/// Light components of a branch keyed by light kind, in pre-order
pub type LightIndex = BTreeMap<LightKind, Vec<ComponentId>>;

/// Opaque handle of an image surface owned by a render back end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

/// Rasterization service consumed by viewports
///
/// The offscreen buffer and its framebuffer bindings are shared by every
/// viewport using the back end, so each draw claims them with
/// [`reset_frame_buffer`](Self::reset_frame_buffer) before writing.
pub trait RenderBackend {
    /// Bind the offscreen framebuffer as render target
    fn reset_frame_buffer(&mut self);

    /// Clear the render target
    fn clear(&mut self, color: Color);

    /// Register a branch, true if this is its first registration
    fn add_branch(&mut self, scene: &SceneGraph, root: NodeId) -> bool;

    /// Refresh all per-node data of registered branches
    fn update(&mut self, scene: &mut SceneGraph);

    /// Set the lights used by following draws
    fn set_lights(&mut self, scene: &SceneGraph, lights: &LightIndex);

    /// Draw a registered branch as seen by the camera
    fn draw_branch(&mut self, scene: &SceneGraph, root: NodeId, camera: &CameraComponent);

    /// Handle of the offscreen image
    fn canvas(&self) -> SurfaceHandle;

    /// Resize the offscreen image
    fn set_canvas_size(&mut self, width: u32, height: u32);

    /// Set the rectangle rendered into
    fn set_viewport_rectangle(&mut self, rect: Rectangle);

    /// Rectangle rendered into
    fn viewport_rectangle(&self) -> Rectangle;
}

/// Visible drawing surface of a viewport
pub trait Canvas {
    /// Rectangle the surface occupies on screen
    fn client_rectangle(&self) -> Rectangle;

    /// Size of the backing store in pixels
    fn size(&self) -> (u32, u32);

    /// Resize the backing store
    fn set_size(&mut self, width: u32, height: u32);

    /// Enable or disable filtering when images are scaled
    fn set_image_smoothing(&mut self, enabled: bool);

    /// Copy `source` of `image` into `destination` of the backing store
    fn draw_image(&mut self, image: SurfaceHandle, source: &Rectangle, destination: &Rectangle);
}
