//! Image-side tensor plumbing: batch stacking and the exact-resize helper.

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use ndarray::{s, Array4, ArrayView3};

use crate::error::DetectError;

/// Stacks uniform RGB images along a new leading batch axis into an NHWC
/// `(batch, height, width, 3)` tensor of raw `0..=255` values.
///
/// Performs no resizing: every image must already share the first image's
/// dimensions, otherwise the call fails and nothing is stacked.
pub fn stack_images(images: &[RgbImage]) -> Result<Array4<f32>, DetectError> {
    if images.is_empty() {
        return Err(DetectError::InvalidInput(
            "cannot stack an empty image batch".to_string(),
        ));
    }
    let (width, height) = images[0].dimensions();
    let (w, h) = (width as usize, height as usize);

    let mut batch = Array4::<f32>::zeros((images.len(), h, w, 3));
    for (i, image) in images.iter().enumerate() {
        if image.dimensions() != (width, height) {
            return Err(DetectError::InvalidInput(format!(
                "image {} is {}x{} but the batch is {}x{}; images must share one shape",
                i,
                image.width(),
                image.height(),
                width,
                height,
            )));
        }
        let view = ArrayView3::from_shape((h, w, 3), image.as_raw())
            .map_err(|e| DetectError::InvalidInput(format!("image {i} buffer mismatch: {e}")))?;
        batch
            .slice_mut(s![i, .., .., ..])
            .zip_mut_with(&view, |dst, &src| *dst = src as f32);
    }

    Ok(batch)
}

/// Resizes to an exact target size with `fast_image_resize`, falling back to
/// `image::imageops` when the fast path rejects the buffer.
pub fn resize_exact(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }

    let src = DynamicImage::ImageRgb8(image.clone());
    let mut resizer = fast_image_resize::Resizer::new();
    let options = fast_image_resize::ResizeOptions {
        algorithm: fast_image_resize::ResizeAlg::Convolution(
            fast_image_resize::FilterType::Bilinear,
        ),
        ..Default::default()
    };

    let mut resized = DynamicImage::new(width, height, src.color());
    if let Err(err) = resizer.resize(&src, &mut resized, &options) {
        log::warn!("fast_image_resize failed ({err}), falling back to imageops");
        return image::imageops::resize(image, width, height, FilterType::Triangle);
    }
    resized.to_rgb8()
}
