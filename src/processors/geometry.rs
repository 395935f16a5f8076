//! Geometric utilities for normalized layout boxes.
//!
//! Layout models report boxes in a fixed `0..=1000` coordinate space that is
//! independent of the source image resolution. [`NormBox`] is the integer
//! rectangle used for every spatial decision in the crate.

use crate::core::constants::NORMALIZED_COORD_MAX;
use serde::{Deserialize, Serialize};

/// An axis-aligned box in normalized `0..=1000` coordinates.
///
/// Serialized as the four-element array `[x1, y1, x2, y2]`. Equality is exact,
/// which is what the entity merge keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct NormBox {
    /// Left edge.
    pub x1: i32,
    /// Top edge.
    pub y1: i32,
    /// Right edge.
    pub x2: i32,
    /// Bottom edge.
    pub y2: i32,
}

impl NormBox {
    /// Creates a box from its corner coordinates.
    #[inline]
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    pub fn left(&self) -> i32 {
        self.x1
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.y1
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x2
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y2
    }

    /// Width of the box; zero for degenerate boxes.
    pub fn width(&self) -> i32 {
        (self.x2 - self.x1).max(0)
    }

    /// Height of the box; zero for degenerate boxes.
    pub fn height(&self) -> i32 {
        (self.y2 - self.y1).max(0)
    }

    /// Area of the box.
    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    /// Vertical center of the box.
    pub fn center_y(&self) -> f32 {
        (self.y1 + self.y2) as f32 / 2.0
    }

    /// Length of the overlap between the horizontal spans of two boxes.
    ///
    /// Returns 0 when the spans are disjoint or merely touch.
    pub fn horizontal_overlap(&self, other: &NormBox) -> i32 {
        (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0)
    }

    /// Vertical distance from the bottom of `self` to the top of `other`.
    ///
    /// Positive only when `other` starts strictly below `self`.
    pub fn gap_below(&self, other: &NormBox) -> i32 {
        other.y1 - self.y2
    }

    /// Checks that every coordinate lies in `0..=1000` and the corners are ordered.
    pub fn check_normalized(&self) -> Result<(), String> {
        let coords = [self.x1, self.y1, self.x2, self.y2];
        if let Some(bad) = coords
            .iter()
            .find(|c| !(0..=NORMALIZED_COORD_MAX).contains(*c))
        {
            return Err(format!(
                "box coordinate {bad} outside [0, {NORMALIZED_COORD_MAX}]"
            ));
        }
        if self.x1 > self.x2 || self.y1 > self.y2 {
            return Err(format!(
                "inverted box [{}, {}, {}, {}]",
                self.x1, self.y1, self.x2, self.y2
            ));
        }
        Ok(())
    }
}

impl From<[i32; 4]> for NormBox {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<NormBox> for [i32; 4] {
    fn from(b: NormBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}
