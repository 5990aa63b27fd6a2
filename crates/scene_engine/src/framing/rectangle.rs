//! Axis-aligned 2D rectangle used throughout the frame pipeline

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Vec2};

/// Reference point used when positioning a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Origin2D {
    /// Position names the top left corner
    #[default]
    TopLeft,
    /// Position names the middle of the top edge
    TopCenter,
    /// Position names the top right corner
    TopRight,
    /// Position names the middle of the left edge
    CenterLeft,
    /// Position names the center
    Center,
    /// Position names the middle of the right edge
    CenterRight,
    /// Position names the bottom left corner
    BottomLeft,
    /// Position names the middle of the bottom edge
    BottomCenter,
    /// Position names the bottom right corner
    BottomRight,
}

impl Origin2D {
    /// Horizontal and vertical fraction of the size to subtract from the position
    fn offsets(self) -> (f32, f32) {
        match self {
            Self::TopLeft => (0.0, 0.0),
            Self::TopCenter => (0.5, 0.0),
            Self::TopRight => (1.0, 0.0),
            Self::CenterLeft => (0.0, 0.5),
            Self::Center => (0.5, 0.5),
            Self::CenterRight => (1.0, 0.5),
            Self::BottomLeft => (0.0, 1.0),
            Self::BottomCenter => (0.5, 1.0),
            Self::BottomRight => (1.0, 1.0),
        }
    }
}

/// Insets on the four sides of a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Border {
    /// Left inset
    pub left: f32,
    /// Top inset
    pub top: f32,
    /// Right inset
    pub right: f32,
    /// Bottom inset
    pub bottom: f32,
}

impl Border {
    /// Create a border from its four insets
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Same inset on every side
    pub const fn uniform(inset: f32) -> Self {
        Self::new(inset, inset, inset, inset)
    }
}

/// Rectangle given by its position and size
///
/// Width and height may be negative; [`left`](Self::left) and friends always
/// report the geometric edges. A zero-sized rectangle is valid and is what a
/// hidden or collapsed surface reports.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    /// Horizontal position
    pub x: f32,
    /// Vertical position
    pub y: f32,
    /// Width, may be negative
    pub width: f32,
    /// Height, may be negative
    pub height: f32,
}

impl Rectangle {
    /// Create a rectangle from its top left corner and size
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Create a rectangle at the origin with the given size
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Create a rectangle whose position names the given origin instead of the top left corner
    pub fn with_origin(x: f32, y: f32, width: f32, height: f32, origin: Origin2D) -> Self {
        let (fx, fy) = origin.offsets();
        Self::new(x - fx * width, y - fy * height, width, height)
    }

    /// Position as a vector
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Size as a vector
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Left edge
    pub fn left(&self) -> f32 {
        if self.width > 0.0 {
            self.x
        } else {
            self.x + self.width
        }
    }

    /// Top edge
    pub fn top(&self) -> f32 {
        if self.height > 0.0 {
            self.y
        } else {
            self.y + self.height
        }
    }

    /// Right edge
    pub fn right(&self) -> f32 {
        if self.width > 0.0 {
            self.x + self.width
        } else {
            self.x
        }
    }

    /// Bottom edge
    pub fn bottom(&self) -> f32 {
        if self.height > 0.0 {
            self.y + self.height
        } else {
            self.y
        }
    }

    /// Absolute area
    pub fn area(&self) -> f32 {
        (self.width * self.height).abs()
    }

    /// True if either dimension is zero
    pub fn is_degenerate(&self) -> bool {
        utils::is_near_zero(self.width) || utils::is_near_zero(self.height)
    }

    /// True if the point lies inside or on the border of this rectangle
    pub fn is_inside(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// True if this rectangle and `other` overlap or touch
    pub fn collides(&self, other: &Self) -> bool {
        !(self.left() > other.right()
            || self.right() < other.left()
            || self.top() > other.bottom()
            || self.bottom() < other.top())
    }

    /// The overlapping area of both rectangles, `None` if they do not collide
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.collides(other) {
            return None;
        }
        let x = self.left().max(other.left());
        let y = self.top().max(other.top());
        Some(Self::new(
            x,
            y,
            self.right().min(other.right()) - x,
            self.bottom().min(other.bottom()) - y,
        ))
    }

    /// Map a point inside this rectangle to the corresponding point inside `target`
    ///
    /// On an axis where this rectangle has zero extent the offset is carried over unscaled.
    pub fn point_to_rect(&self, point: Vec2, target: &Self) -> Vec2 {
        let scale = |from: f32, to: f32| if utils::is_near_zero(from) { 1.0 } else { to / from };
        Vec2::new(
            (point.x - self.x) * scale(self.width, target.width) + target.x,
            (point.y - self.y) * scale(self.height, target.height) + target.y,
        )
    }
}
