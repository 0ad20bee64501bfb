use serde::{Deserialize, Serialize};

use crate::common::DetBox;

/// One decoded detection: resolved class label, confidence in `[0, 1]`, and
/// bounding box in absolute pixel coordinates of the original image.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: DetBox,
}

impl Detection {
    pub fn new(label: String, confidence: f32, bbox: DetBox) -> Self {
        Self {
            label,
            confidence,
            bbox,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn bbox(&self) -> &DetBox {
        &self.bbox
    }
}

impl std::fmt::Display for Detection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({:.2}) @ ({:.1}, {:.1})-({:.1}, {:.1})",
            self.label,
            self.confidence,
            self.bbox.x_min,
            self.bbox.y_min,
            self.bbox.x_max,
            self.bbox.y_max,
        )
    }
}
