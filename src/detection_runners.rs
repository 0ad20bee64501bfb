mod inference_backend;
pub mod ort_ssd;

pub use inference_backend::InferenceBackend;
pub use ort_ssd::OrtSsdEngine;
