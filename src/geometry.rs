//! Axis-aligned box arithmetic shared by ROI search, refinement, and assembly
//!
//! All boxes are `(x1, y1, x2, y2)` in post-orientation pixel coordinates with
//! `x1 < x2` and `y1 < y2` once clamped to the image.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in integer pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    /// Create a box from corner coordinates
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box covering a full image
    pub fn full_image(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub fn width(&self) -> i32 {
        (self.x2 - self.x1).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y2 - self.y1).max(0)
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    /// Center point of the box
    pub fn center(&self) -> (f32, f32) {
        (
            (self.x1 + self.x2) as f32 / 2.0,
            (self.y1 + self.y2) as f32 / 2.0,
        )
    }

    /// Characteristic size: the larger of width and height
    pub fn size(&self) -> f32 {
        self.width().max(self.height()) as f32
    }

    /// Whether the box is degenerate (zero or negative extent)
    pub fn is_empty(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    /// Whether a point lies inside the box (inclusive bounds)
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x1 as f32 && x <= self.x2 as f32 && y >= self.y1 as f32 && y <= self.y2 as f32
    }

    /// Whether `other` lies entirely inside this box
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        other.x1 >= self.x1 && other.y1 >= self.y1 && other.x2 <= self.x2 && other.y2 <= self.y2
    }

    /// Clamp the box to image bounds
    pub fn clamp_to_image(&self, width: u32, height: u32) -> Self {
        Self::new(
            self.x1.clamp(0, width as i32),
            self.y1.clamp(0, height as i32),
            self.x2.clamp(0, width as i32),
            self.y2.clamp(0, height as i32),
        )
    }

    /// Intersect with another box
    pub fn clip_to(&self, other: &BoundingBox) -> Self {
        Self::new(
            self.x1.max(other.x1),
            self.y1.max(other.y1),
            self.x2.min(other.x2),
            self.y2.min(other.y2),
        )
    }

    /// Grow the box outward by a fraction of its own width/height, clipped to
    /// the image
    pub fn pad_fraction(&self, pad_frac: f32, width: u32, height: u32) -> Self {
        if pad_frac <= 0.0 {
            return *self;
        }
        let w = self.width().max(1);
        let h = self.height().max(1);
        let px = (w as f32 * pad_frac) as i32;
        let py = (h as f32 * pad_frac) as i32;
        Self::new(self.x1 - px, self.y1 - py, self.x2 + px, self.y2 + py)
            .clamp_to_image(width, height)
    }

    /// Shrink the box inward by a fraction of its width/height on each side
    pub fn shrink_fraction(&self, shrink: f32) -> Self {
        let w = self.width().max(1);
        let h = self.height().max(1);
        let sx = (w as f32 * shrink) as i32;
        let sy = (h as f32 * shrink) as i32;
        Self::new(self.x1 + sx, self.y1 + sy, self.x2 - sx, self.y2 - sy)
    }
}

/// Build a square box around a center point, clipped to the image
///
/// The clipped rectangle is forced square by taking the smaller of its two
/// dimensions, anchored at the top-left corner. This keeps ROI candidates
/// square even when the seed sits near an image border.
pub fn square_from_center(cx: f32, cy: f32, half: f32, width: u32, height: u32) -> BoundingBox {
    let x1 = (cx - half).max(0.0) as i32;
    let y1 = (cy - half).max(0.0) as i32;
    let x2 = (cx + half).min(width as f32) as i32;
    let y2 = (cy + half).min(height as f32) as i32;
    let side = (x2 - x1).min(y2 - y1);
    BoundingBox::new(x1, y1, x1 + side, y1 + side)
}
