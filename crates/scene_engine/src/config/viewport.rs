//! Viewport configuration

use serde::{Deserialize, Serialize};

use super::Config;
use crate::framing::Framing;
use crate::render::InputActivation;

/// Frame chain and behavior of a [`Viewport`](crate::render::Viewport)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Viewport name
    pub name: String,
    /// Client rectangle to canvas size
    pub frame_client_to_canvas: Framing,
    /// Canvas to the painted destination rectangle
    pub frame_canvas_to_destination: Framing,
    /// Destination to the region read from the offscreen buffer
    pub frame_destination_to_source: Framing,
    /// Source to the render surface
    pub frame_source_to_render: Framing,
    /// Re-derive the frames on every draw
    pub adjusting_frames: bool,
    /// Re-project the camera on every draw
    pub adjusting_camera: bool,
    /// Native input forwarded into the branch
    pub input: InputActivation,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            name: "Viewport".to_string(),
            frame_client_to_canvas: Framing::identity(),
            frame_canvas_to_destination: Framing::complex(),
            frame_destination_to_source: Framing::identity(),
            frame_source_to_render: Framing::identity(),
            adjusting_frames: true,
            adjusting_camera: true,
            input: InputActivation::empty(),
        }
    }
}

impl Config for ViewportConfig {}
