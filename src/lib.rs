mod detection_decoding;
mod detector;
mod utils;
pub mod common;
pub mod data;
pub mod detection_runners;
pub mod error;
pub mod image_ops;

pub use common::{
    ClassLabelTable, DetBox, Detection, DetectorConfig, ImageBatch, ImageSize, InferenceDevice,
    ROLE_DETECTION_BOXES, ROLE_DETECTION_CLASSES, ROLE_DETECTION_SCORES, ROLE_NUM_DETECTIONS,
};
pub use data::RawDetections;
pub use detection_runners::{InferenceBackend, OrtSsdEngine};
pub use detector::BatchDetector;
pub use error::DetectError;

pub type Result<T, E = DetectError> = std::result::Result<T, E>;

/// Loads a frozen detection graph and returns a ready batch detector.
///
/// The graph allocation is the dominant cost and happens exactly once here;
/// the returned detector holds the session for its whole lifetime.
pub fn load_detector(config: &DetectorConfig) -> Result<BatchDetector<OrtSsdEngine>> {
    BatchDetector::load(config)
}
