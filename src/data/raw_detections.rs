use ndarray::{Array1, Array2, Array3, ArrayD, Ix1, Ix2, Ix3};

use crate::error::DetectError;

/// Raw per-batch inference output, keyed by role.
///
/// Shapes: `num_detections [batch]`, `classes [batch, max]`,
/// `scores [batch, max]`, `boxes [batch, max, 4]` with each box stored as
/// `(y_min, x_min, y_max, x_max)` normalized to `[0, 1]`.
///
/// Entries at `j >= num_detections[i]` are undefined and must not be read.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetections {
    num_detections: Array1<f32>,
    classes: Array2<f32>,
    scores: Array2<f32>,
    boxes: Array3<f32>,
}

impl RawDetections {
    pub fn from_parts(
        num_detections: Array1<f32>,
        classes: Array2<f32>,
        scores: Array2<f32>,
        boxes: Array3<f32>,
    ) -> Result<Self, DetectError> {
        let batch = num_detections.len();
        let max = classes.shape()[1];

        if classes.shape()[0] != batch || scores.shape()[0] != batch || boxes.shape()[0] != batch {
            return Err(DetectError::MalformedOutput(format!(
                "inconsistent batch sizes: num_detections={}, classes={}, scores={}, boxes={}",
                batch,
                classes.shape()[0],
                scores.shape()[0],
                boxes.shape()[0],
            )));
        }
        if scores.shape()[1] != max || boxes.shape()[1] != max {
            return Err(DetectError::MalformedOutput(format!(
                "inconsistent detection counts: classes={}, scores={}, boxes={}",
                max,
                scores.shape()[1],
                boxes.shape()[1],
            )));
        }
        if boxes.shape()[2] != 4 {
            return Err(DetectError::MalformedOutput(format!(
                "boxes tensor has {} coordinates per box, expected 4",
                boxes.shape()[2],
            )));
        }

        Ok(Self {
            num_detections,
            classes,
            scores,
            boxes,
        })
    }

    /// Builds from dynamically shaped tensors as extracted from a session.
    /// `num_detections` may arrive as `[batch]` or `[batch, 1]`.
    pub fn from_dyn(
        num_detections: ArrayD<f32>,
        classes: ArrayD<f32>,
        scores: ArrayD<f32>,
        boxes: ArrayD<f32>,
    ) -> Result<Self, DetectError> {
        let num_detections = match num_detections.ndim() {
            1 => num_detections.into_dimensionality::<Ix1>().unwrap(),
            2 if num_detections.shape()[1] == 1 => num_detections
                .into_dimensionality::<Ix2>()
                .unwrap()
                .column(0)
                .to_owned(),
            _ => {
                return Err(DetectError::MalformedOutput(format!(
                    "num_detections tensor has shape {:?}, expected [batch]",
                    num_detections.shape(),
                )))
            }
        };
        let classes = classes.into_dimensionality::<Ix2>().map_err(|_| {
            DetectError::MalformedOutput("detection_classes tensor is not 2-D".to_string())
        })?;
        let scores = scores.into_dimensionality::<Ix2>().map_err(|_| {
            DetectError::MalformedOutput("detection_scores tensor is not 2-D".to_string())
        })?;
        let boxes = boxes.into_dimensionality::<Ix3>().map_err(|_| {
            DetectError::MalformedOutput("detection_boxes tensor is not 3-D".to_string())
        })?;

        Self::from_parts(num_detections, classes, scores, boxes)
    }

    pub fn batch_len(&self) -> usize {
        self.num_detections.len()
    }

    /// Upper bound on detections per image in the raw arrays.
    pub fn max_detections(&self) -> usize {
        self.classes.shape()[1]
    }

    /// Valid detection count for image `i`, truncated to an integer and
    /// clamped to the raw array width.
    pub fn count(&self, i: usize) -> usize {
        (self.num_detections[i] as usize).min(self.max_detections())
    }

    pub fn class_id(&self, i: usize, j: usize) -> i64 {
        self.classes[[i, j]] as i64
    }

    pub fn score(&self, i: usize, j: usize) -> f32 {
        self.scores[[i, j]]
    }

    /// Normalized box for detection `j` of image `i` as `(y_min, x_min, y_max, x_max)`.
    pub fn bbox_norm(&self, i: usize, j: usize) -> (f32, f32, f32, f32) {
        (
            self.boxes[[i, j, 0]],
            self.boxes[[i, j, 1]],
            self.boxes[[i, j, 2]],
            self.boxes[[i, j, 3]],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2, Array3, ArrayD, IxDyn};

    #[test]
    fn rejects_inconsistent_batch() {
        let err = RawDetections::from_parts(
            Array1::zeros(2),
            Array2::zeros((3, 5)),
            Array2::zeros((2, 5)),
            Array3::zeros((2, 5, 4)),
        )
        .unwrap_err();
        assert!(matches!(err, DetectError::MalformedOutput(_)));
    }

    #[test]
    fn rejects_non_4_coordinate_boxes() {
        let err = RawDetections::from_parts(
            Array1::zeros(1),
            Array2::zeros((1, 5)),
            Array2::zeros((1, 5)),
            Array3::zeros((1, 5, 5)),
        )
        .unwrap_err();
        assert!(matches!(err, DetectError::MalformedOutput(_)));
    }

    #[test]
    fn squeezes_column_shaped_num_detections() {
        let raw = RawDetections::from_dyn(
            ArrayD::from_shape_vec(IxDyn(&[2, 1]), vec![3., 1.]).unwrap(),
            ArrayD::zeros(IxDyn(&[2, 5])),
            ArrayD::zeros(IxDyn(&[2, 5])),
            ArrayD::zeros(IxDyn(&[2, 5, 4])),
        )
        .unwrap();
        assert_eq!(raw.count(0), 3);
        assert_eq!(raw.count(1), 1);
    }

    #[test]
    fn count_truncates_and_clamps() {
        let raw = RawDetections::from_parts(
            Array1::from_vec(vec![2.9, 99.]),
            Array2::zeros((2, 5)),
            Array2::zeros((2, 5)),
            Array3::zeros((2, 5, 4)),
        )
        .unwrap();
        assert_eq!(raw.count(0), 2);
        assert_eq!(raw.count(1), 5);
    }
}
