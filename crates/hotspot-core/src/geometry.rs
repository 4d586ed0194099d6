#![forbid(unsafe_code)]

//! Geometric primitives.

use serde::{Deserialize, Serialize};

/// A planar coordinate normalized to the video frame.
///
/// Both axes are expected in `[0, 1]`, with the origin at the top-left of the
/// frame. Values outside that range are representable (stored documents are
/// not re-validated) but every editor interaction clamps into it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position as a fraction of frame width.
    pub x: f64,
    /// Vertical position as a fraction of frame height.
    pub y: f64,
}

impl Point {
    /// Frame center.
    pub const CENTER: Point = Point::new(0.5, 0.5);

    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation between `self` (at `fac == 0`) and `other`
    /// (at `fac == 1`).
    #[inline]
    pub fn lerp(self, other: Point, fac: f64) -> Point {
        let inv = 1.0 - fac;
        Point {
            x: fac * other.x + inv * self.x,
            y: fac * other.y + inv * self.y,
        }
    }

    /// Clamp both axes into the unit square.
    #[inline]
    pub fn clamp_unit(self) -> Point {
        Point {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
        }
    }

    /// Component-wise offset.
    #[inline]
    pub fn offset(self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Vector from `self` to `other`.
    #[inline]
    pub fn delta_to(self, other: Point) -> (f64, f64) {
        (other.x - self.x, other.y - self.y)
    }
}
