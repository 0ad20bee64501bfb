use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in absolute pixel coordinates of the original
/// image, stored as `(x_min, y_min, x_max, y_max)`.
#[derive(Default, Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DetBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl DetBox {
    pub fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Returns the width of the bounding box.
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    /// Returns the height of the bounding box.
    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    /// Computes the area of the bounding box.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Returns the center coordinates of the bounding box as `(cx, cy)`.
    pub fn center(&self) -> (f32, f32) {
        (
            self.x_min + self.width() / 2.,
            self.y_min + self.height() / 2.,
        )
    }

    /// Computes the intersection area between this bounding box and another.
    pub fn intersect(&self, other: &DetBox) -> f32 {
        let left = self.x_min.max(other.x_min);
        let right = self.x_max.min(other.x_max);
        let top = self.y_min.max(other.y_min);
        let bottom = self.y_max.min(other.y_max);
        (right - left).max(0.) * (bottom - top).max(0.)
    }

    /// Computes the union area between this bounding box and another.
    pub fn union(&self, other: &DetBox) -> f32 {
        self.area() + other.area() - self.intersect(other)
    }

    /// Computes the intersection over union (IoU) between this bounding box and another.
    pub fn iou(&self, other: &DetBox) -> f32 {
        self.intersect(other) / self.union(other)
    }

    /// Checks if this bounding box completely contains `other`.
    pub fn contains(&self, other: &DetBox) -> bool {
        self.x_min <= other.x_min
            && self.x_max >= other.x_max
            && self.y_min <= other.y_min
            && self.y_max >= other.y_max
    }

    /// Returns the box as rounded `(x_min, y_min, x_max, y_max)` integers.
    pub fn as_x1y1_x2y2_i32(&self) -> (i32, i32, i32, i32) {
        (
            self.x_min.round() as i32,
            self.y_min.round() as i32,
            self.x_max.round() as i32,
            self.y_max.round() as i32,
        )
    }

    /// Returns the box as rounded `(x, y, w, h)` integers.
    pub fn as_xy_wh_i32(&self) -> (i32, i32, i32, i32) {
        (
            self.x_min.round() as i32,
            self.y_min.round() as i32,
            self.width().round() as i32,
            self.height().round() as i32,
        )
    }
}
