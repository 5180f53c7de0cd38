//! Match geometry
//!
//! A candidate is the best-scoring placement of one marker in one frame.

use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top_left(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Check whether the box lies entirely inside an image of the given size
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }
}

/// Best placement of a marker in a frame, before verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub marker: String,
    /// Normalized correlation coefficient in [-1, 1]
    pub score: f64,
    /// Scale factor applied to the marker for this placement
    pub scale: f64,
    pub bbox: BBox,
}

impl MatchCandidate {
    pub fn passes(&self, threshold: f64) -> bool {
        self.score >= threshold
    }
}
