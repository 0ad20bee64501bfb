//! The crate's typed error taxonomy.
//!
//! One `thiserror` enum (`DetectError`) names every failure mode the library
//! surfaces, per SPEC_FULL.md §6.

use thiserror::Error;

/// All failures the detection library can surface.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Fatal configuration problem detected at load.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required artifact (e.g. the frozen graph file) was not found.
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    /// Per-call, recoverable problem with the caller-supplied input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Runtime failure propagated from the inference session.
    #[error("inference error: {0}")]
    Inference(#[from] ort::Error),

    /// The graph emitted tensors whose shapes do not match the SSD output
    /// contract.
    #[error("malformed output: {0}")]
    MalformedOutput(String),
}
