//! 2D content-space primitives.
//!
//! Content space is y-up: `leftBottom` is the lower-left corner of the content
//! box and messages stack upward from it.

use serde::{Deserialize, Serialize};

/// A point or displacement in content space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component (y-up).
    pub y: f32,
}

impl Vec2 {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise sum.
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Axis-aligned bounding box reported by the shaping adapter.
///
/// Coordinates are relative to the text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Lowest x.
    pub min_x: f32,
    /// Highest x.
    pub max_x: f32,
    /// Lowest y.
    pub min_y: f32,
    /// Highest y.
    pub max_y: f32,
}

impl BoundingBox {
    /// Create a bounding box from its extents.
    pub fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Vertical extent (`max_y - min_y`).
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Horizontal extent (`max_x - min_x`).
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }
}

/// Rectangle anchored at its lower-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Lower-left corner.
    pub origin: Vec2,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Create a rectangle from its lower-left corner and size.
    pub fn new(origin: Vec2, width: f32, height: f32) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// Y coordinate of the top edge.
    pub fn top(&self) -> f32 {
        self.origin.y + self.height
    }
}
