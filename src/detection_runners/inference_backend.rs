use ndarray::ArrayView4;

use crate::data::RawDetections;
use crate::error::DetectError;

/// Seam between the batch detector and the inference runtime.
///
/// One call serves the whole batch: the input is a stacked NHWC
/// `(batch, height, width, 3)` tensor of raw `0..=255` values, the output the
/// role-keyed raw detections for every image in it.
pub trait InferenceBackend: Send + Sync {
    fn infer(&self, batch: ArrayView4<f32>) -> Result<RawDetections, DetectError>;
}
