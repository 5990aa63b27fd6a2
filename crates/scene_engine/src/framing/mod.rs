//! Rectangles and frame policies
//!
//! A frame policy ([`Framing`]) maps one rectangle (the frame) into a derived
//! rectangle and translates points between the frame and the derived rectangle.
//! The viewport chains four of them to get from the on-screen client area down to
//! the offscreen render surface.

pub mod policy;
pub mod rectangle;

pub use policy::{AxisFraming, Extent, Framing};
pub use rectangle::{Border, Origin2D, Rectangle};
