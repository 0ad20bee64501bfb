use std::time::{Duration, Instant};

use image::RgbImage;

use crate::common::{ClassLabelTable, Detection, DetectorConfig, ImageBatch, ImageSize};
use crate::detection_decoding::decode_batch;
use crate::detection_runners::{InferenceBackend, OrtSsdEngine};
use crate::error::DetectError;
use crate::{image_ops, utils};

/// Batch object detector: stacks uniform images, runs one inference call for
/// the whole batch, and decodes the output into one detection list per image.
///
/// The backend and label table are read-only for the detector's lifetime; a
/// failed call never corrupts state, the instance stays usable.
#[derive(Debug)]
pub struct BatchDetector<B = OrtSsdEngine> {
    backend: B,
    labels: ClassLabelTable,
    conf_threshold: f32,
}

impl BatchDetector<OrtSsdEngine> {
    /// Loads the frozen graph and wires up the class label table: a labels
    /// file when configured, otherwise the `names` dictionary embedded in the
    /// graph's metadata.
    pub fn load(config: &DetectorConfig) -> Result<Self, DetectError> {
        let engine = OrtSsdEngine::load(config)?;

        let labels = match &config.labels_path {
            Some(path) => ClassLabelTable::from_file(path)?,
            None => match engine.try_fetch("names") {
                Some(names) => ClassLabelTable::from_metadata_names(&names),
                None => ClassLabelTable::default(),
            },
        };
        if labels.is_empty() {
            return Err(DetectError::Configuration(
                "no class label source: set 'labels_path' or embed 'names' metadata in the graph"
                    .to_string(),
            ));
        }
        log::info!(
            "Detector ready: {} classes, confidence threshold {}",
            labels.len(),
            config.conf_threshold,
        );

        Ok(Self::new(engine, labels, config.conf_threshold))
    }
}

impl<B: InferenceBackend> BatchDetector<B> {
    pub fn new(backend: B, labels: ClassLabelTable, conf_threshold: f32) -> Self {
        Self {
            backend,
            labels,
            conf_threshold,
        }
    }

    /// Detects objects in a batch of images.
    ///
    /// `sizes[i]` is the original (pre-resize) size of `images[i]`; decoded
    /// boxes are denormalized into that space. The result always has exactly
    /// one entry per input image, in input order.
    pub fn detect(
        &self,
        images: &[RgbImage],
        sizes: &[ImageSize],
    ) -> Result<Vec<Vec<Detection>>, DetectError> {
        if images.len() != sizes.len() {
            return Err(DetectError::InvalidInput(format!(
                "got {} images but {} original sizes",
                images.len(),
                sizes.len()
            )));
        }
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let batch = image_ops::stack_images(images)?;
        let elapsed = utils::trace("Stacking input", start, Duration::ZERO);

        let raw = self.backend.infer(batch.view())?;
        let elapsed = utils::trace("Inference", start, elapsed);

        if raw.batch_len() != images.len() {
            return Err(DetectError::MalformedOutput(format!(
                "graph returned {} result rows for a batch of {}",
                raw.batch_len(),
                images.len()
            )));
        }

        let detections = decode_batch(&raw, sizes, &self.labels, self.conf_threshold);
        utils::trace("Decoding", start, elapsed);

        Ok(detections)
    }

    /// Convenience over [`detect`](Self::detect) for a pre-assembled batch.
    pub fn detect_batch(&self, batch: &ImageBatch) -> Result<Vec<Vec<Detection>>, DetectError> {
        self.detect(batch.images(), batch.sizes())
    }

    pub fn conf_threshold(&self) -> f32 {
        self.conf_threshold
    }

    pub fn labels(&self) -> &ClassLabelTable {
        &self.labels
    }
}
