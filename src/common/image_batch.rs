use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::DetectError;
use crate::image_ops;

/// Original (pre-resize) pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn of(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }
}

/// A batch of model-input images paired with the original size of each.
///
/// Invariant: `images.len() == sizes.len()`. The images themselves must share
/// identical dimensions (they are stacked into one tensor); the sizes carry
/// what each image measured before any upstream resize, so decoded boxes land
/// in the caller's original pixel space.
#[derive(Debug, Clone, Default)]
pub struct ImageBatch {
    images: Vec<RgbImage>,
    sizes: Vec<ImageSize>,
}

impl ImageBatch {
    pub fn new(images: Vec<RgbImage>, sizes: Vec<ImageSize>) -> Result<Self, DetectError> {
        if images.len() != sizes.len() {
            return Err(DetectError::InvalidInput(format!(
                "got {} images but {} original sizes",
                images.len(),
                sizes.len()
            )));
        }
        Ok(Self { images, sizes })
    }

    /// Builds a batch straight from uniform images, recording their own
    /// dimensions as the original sizes.
    pub fn from_images(images: Vec<RgbImage>) -> Self {
        let sizes = images.iter().map(ImageSize::of).collect();
        Self { images, sizes }
    }

    /// Resizes arbitrary-sized originals to one model-input size and records
    /// each original's dimensions for later denormalization.
    pub fn from_originals(originals: &[RgbImage], width: u32, height: u32) -> Self {
        let sizes = originals.iter().map(ImageSize::of).collect();
        let images = originals
            .iter()
            .map(|img| image_ops::resize_exact(img, width, height))
            .collect();
        Self { images, sizes }
    }

    pub fn images(&self) -> &[RgbImage] {
        &self.images
    }

    pub fn sizes(&self) -> &[ImageSize] {
        &self.sizes
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_lengths() {
        let images = vec![RgbImage::new(4, 4)];
        let err = ImageBatch::new(images, vec![]).unwrap_err();
        assert!(matches!(err, DetectError::InvalidInput(_)));
    }

    #[test]
    fn from_originals_resizes_and_keeps_sizes() {
        let originals = vec![RgbImage::new(64, 48), RgbImage::new(20, 10)];
        let batch = ImageBatch::from_originals(&originals, 32, 32);
        assert_eq!(batch.len(), 2);
        assert!(batch.images().iter().all(|i| i.dimensions() == (32, 32)));
        assert_eq!(batch.sizes()[0], ImageSize::new(64, 48));
        assert_eq!(batch.sizes()[1], ImageSize::new(20, 10));
    }
}
