//! Center-format bounding boxes and overlap arithmetic

use opencv::core::Rect;
use serde::{Deserialize, Serialize};

/// Axis-aligned box described by its center and size, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    /// Create a new bounding box from its center and size
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Box of `width_fraction` x `height_fraction` of an image, centered in it
    pub fn centered(image_width: f64, image_height: f64, width_fraction: f64, height_fraction: f64) -> Self {
        Self::new(
            image_width / 2.0,
            image_height / 2.0,
            image_width * width_fraction,
            image_height * height_fraction,
        )
    }

    pub fn left(&self) -> f64 {
        self.x - self.width / 2.0
    }

    pub fn top(&self) -> f64 {
        self.y - self.height / 2.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Area of the box; degenerate sizes count as zero
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection over union with another box, in [0, 1]
    pub fn iou(&self, other: &BBox) -> f64 {
        let x1 = self.left().max(other.left());
        let y1 = self.top().max(other.top());
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        if x2 < x1 || y2 < y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) * (y2 - y1);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }

        (intersection / union).clamp(0.0, 1.0)
    }

    /// Integer pixel rectangle of the box clipped to an image, truncating toward
    /// zero. `None` when nothing of the box lies inside the image.
    pub fn clip_to_image(&self, image_width: i32, image_height: i32) -> Option<Rect> {
        let cx = self.x.trunc();
        let cy = self.y.trunc();
        let w = self.width.trunc();
        let h = self.height.trunc();

        let x1 = ((cx - w / 2.0) as i32).max(0);
        let y1 = ((cy - h / 2.0) as i32).max(0);
        let x2 = ((cx + w / 2.0) as i32).min(image_width);
        let y2 = ((cy + h / 2.0) as i32).min(image_height);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
    }
}
