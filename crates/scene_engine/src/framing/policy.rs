//! Frame policies
//!
//! A [`Framing`] takes a rectangle as the frame and derives a new rectangle from it.
//! Points are mapped from the frame's coordinate space into the local space of the
//! derived rectangle (origin at its top left corner) with [`Framing::map_point`], and
//! back with [`Framing::map_point_inverse`]. All mappings are pure.
//!
//! Degenerate input never panics or produces NaN: when a division would be by zero
//! the affected axis falls back to translation only, i.e. the point is carried over
//! unscaled.

use serde::{Deserialize, Serialize};

use super::rectangle::{Border, Rectangle};
use crate::foundation::math::{utils, Vec2};

/// A length given as a fraction of a reference length plus a fixed number of pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Extent {
    /// Fraction of the reference length
    pub fraction: f32,
    /// Absolute pixels added to the fractional part
    pub pixels: f32,
}

impl Extent {
    /// Zero length
    pub const ZERO: Self = Self::new(0.0, 0.0);
    /// The whole reference length
    pub const FULL: Self = Self::new(1.0, 0.0);

    /// Create an extent from both parts
    pub const fn new(fraction: f32, pixels: f32) -> Self {
        Self { fraction, pixels }
    }

    /// Purely absolute length
    pub const fn pixels(pixels: f32) -> Self {
        Self::new(0.0, pixels)
    }

    /// Purely relative length
    pub const fn fraction(fraction: f32) -> Self {
        Self::new(fraction, 0.0)
    }

    /// Resolve against a reference length
    pub fn resolve(&self, length: f32) -> f32 {
        self.fraction * length + self.pixels
    }
}

/// How a derived rectangle is placed along one axis of its frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AxisFraming {
    /// Span the frame, inset from both ends
    Stretch {
        /// Inset from the start of the frame
        start: Extent,
        /// Inset from the end of the frame
        end: Extent,
    },
    /// Fixed size, positioned from the start of the frame
    Start {
        /// Distance from the start of the frame
        offset: Extent,
        /// Size along the axis
        size: Extent,
    },
    /// Fixed size, centered in the frame and shifted by `offset`
    Center {
        /// Shift away from the centered position
        offset: Extent,
        /// Size along the axis
        size: Extent,
    },
    /// Fixed size, positioned from the end of the frame
    End {
        /// Distance from the end of the frame
        offset: Extent,
        /// Size along the axis
        size: Extent,
    },
}

impl Default for AxisFraming {
    fn default() -> Self {
        Self::Stretch { start: Extent::ZERO, end: Extent::ZERO }
    }
}

impl AxisFraming {
    /// Resolve into (start, length) for a frame spanning `origin..origin + length`
    fn resolve(&self, origin: f32, length: f32) -> (f32, f32) {
        match *self {
            Self::Stretch { start, end } => {
                let min = origin + start.resolve(length);
                let max = origin + length - end.resolve(length);
                (min, max - min)
            }
            Self::Start { offset, size } => (origin + offset.resolve(length), size.resolve(length)),
            Self::Center { offset, size } => {
                let size = size.resolve(length);
                (origin + (length - size) * 0.5 + offset.resolve(length), size)
            }
            Self::End { offset, size } => {
                let size = size.resolve(length);
                (origin + length - size - offset.resolve(length), size)
            }
        }
    }
}

/// Mapping of a frame rectangle into a derived rectangle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Framing {
    /// The derived rectangle has a fixed size at the origin, display scales to fit the frame
    Fixed {
        /// Width of the derived rectangle
        width: f32,
        /// Height of the derived rectangle
        height: f32,
    },
    /// The derived rectangle is the frame scaled per axis and anchored at the origin
    Scaled {
        /// Horizontal scale factor
        norm_width: f32,
        /// Vertical scale factor
        norm_height: f32,
    },
    /// The derived rectangle is the frame inset by a fractional margin plus a pixel padding
    Complex {
        /// Insets as fractions of the frame size
        margin: Border,
        /// Insets in pixels
        padding: Border,
    },
    /// Each axis placed independently, see [`AxisFraming`]
    Anchored {
        /// Placement along x
        horizontal: AxisFraming,
        /// Placement along y
        vertical: AxisFraming,
    },
}

impl Default for Framing {
    fn default() -> Self {
        Self::identity()
    }
}

impl Framing {
    /// Scaled framing with factor one, derived rectangle equals the frame moved to the origin
    pub const fn identity() -> Self {
        Self::scaled(1.0, 1.0)
    }

    /// Fixed size framing
    pub const fn fixed(width: f32, height: f32) -> Self {
        Self::Fixed { width, height }
    }

    /// Per-axis scaled framing
    pub const fn scaled(norm_width: f32, norm_height: f32) -> Self {
        Self::Scaled { norm_width, norm_height }
    }

    /// Complex framing without any insets
    pub const fn complex() -> Self {
        Self::Complex { margin: Border::uniform(0.0), padding: Border::uniform(0.0) }
    }

    /// Derive the rectangle for the given frame
    pub fn map_rect(&self, frame: &Rectangle) -> Rectangle {
        match self {
            Self::Fixed { width, height } => Rectangle::from_size(*width, *height),
            Self::Scaled { norm_width, norm_height } => {
                Rectangle::from_size(norm_width * frame.width, norm_height * frame.height)
            }
            Self::Complex { margin, padding } => {
                let min_x = frame.x + margin.left * frame.width + padding.left;
                let min_y = frame.y + margin.top * frame.height + padding.top;
                let max_x = frame.x + (1.0 - margin.right) * frame.width - padding.right;
                let max_y = frame.y + (1.0 - margin.bottom) * frame.height - padding.bottom;
                Rectangle::new(min_x, min_y, max_x - min_x, max_y - min_y)
            }
            Self::Anchored { horizontal, vertical } => {
                let (x, width) = horizontal.resolve(frame.x, frame.width);
                let (y, height) = vertical.resolve(frame.y, frame.height);
                Rectangle::new(x, y, width, height)
            }
        }
    }

    /// Map a point given in the frame's space into the local space of the derived rectangle
    pub fn map_point(&self, point: Vec2, frame: &Rectangle) -> Vec2 {
        match self {
            Self::Fixed { width, height } => Vec2::new(
                scale_into(point.x - frame.x, *width, frame.width),
                scale_into(point.y - frame.y, *height, frame.height),
            ),
            Self::Scaled { norm_width, norm_height } => {
                Vec2::new(norm_width * (point.x - frame.x), norm_height * (point.y - frame.y))
            }
            Self::Complex { .. } | Self::Anchored { .. } => point - self.map_rect(frame).position(),
        }
    }

    /// Map a point given in the local space of the derived rectangle back into the frame's space
    pub fn map_point_inverse(&self, point: Vec2, frame: &Rectangle) -> Vec2 {
        match self {
            Self::Fixed { width, height } => Vec2::new(
                scale_into(point.x, frame.width, *width) + frame.x,
                scale_into(point.y, frame.height, *height) + frame.y,
            ),
            Self::Scaled { norm_width, norm_height } => Vec2::new(
                scale_into(point.x, 1.0, *norm_width) + frame.x,
                scale_into(point.y, 1.0, *norm_height) + frame.y,
            ),
            Self::Complex { .. } | Self::Anchored { .. } => point + self.map_rect(frame).position(),
        }
    }
}

/// `value * numerator / denominator`, or `value` unchanged when the denominator is zero
fn scale_into(value: f32, numerator: f32, denominator: f32) -> f32 {
    if utils::is_near_zero(denominator) {
        value
    } else {
        value * numerator / denominator
    }
}
