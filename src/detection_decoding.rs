//! Decodes one batch of raw detector output into per-image detection lists.

use rayon::prelude::*;

use crate::common::{ClassLabelTable, DetBox, Detection, ImageSize};
use crate::data::RawDetections;

/// Decodes every image of the batch. The outer vector always has one entry
/// per image, in input order; images with no surviving detections yield an
/// empty inner vector.
///
/// Decoding is parallel across images; the indexed collect keeps the output
/// order equal to the input order regardless of execution order.
pub(crate) fn decode_batch(
    raw: &RawDetections,
    sizes: &[ImageSize],
    labels: &ClassLabelTable,
    conf_threshold: f32,
) -> Vec<Vec<Detection>> {
    sizes
        .par_iter()
        .enumerate()
        .map(|(i, &size)| decode_image(raw, i, size, labels, conf_threshold))
        .collect()
}

/// Decodes the detections of image `i`.
///
/// Only indices `j < num_detections[i]` are read; entries beyond that are
/// undefined in the raw arrays. Detections keep the raw output order, with
/// no sorting or suppression. A raw class id absent from the label table
/// drops that single detection; a confidence strictly below the threshold
/// drops it (a score exactly equal to the threshold is kept).
fn decode_image(
    raw: &RawDetections,
    i: usize,
    size: ImageSize,
    labels: &ClassLabelTable,
    conf_threshold: f32,
) -> Vec<Detection> {
    let n = raw.count(i);
    let mut detections = Vec::with_capacity(n);

    for j in 0..n {
        let class_id = raw.class_id(i, j);
        let label = match labels.name(class_id) {
            Some(label) => label,
            None => {
                log::warn!(
                    "image {}: detection {} references unknown class id {}, dropping",
                    i,
                    j,
                    class_id
                );
                continue;
            }
        };

        let confidence = raw.score(i, j);
        if confidence < conf_threshold {
            continue;
        }

        // Boxes arrive normalized as (y_min, x_min, y_max, x_max); denormalize
        // against the image's original size, not the stacked model-input size.
        let (y_min, x_min, y_max, x_max) = raw.bbox_norm(i, j);
        let (orig_w, orig_h) = (size.width as f32, size.height as f32);
        let bbox = DetBox::new(x_min * orig_w, y_min * orig_h, x_max * orig_w, y_max * orig_h);

        detections.push(Detection::new(label.to_string(), confidence, bbox));
    }

    detections
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2, Array3};

    fn table() -> ClassLabelTable {
        ClassLabelTable::from_pairs([(1, "person"), (2, "bicycle"), (3, "car")])
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-3,
            "{actual} differs from {expected}"
        );
    }

    fn raw_single(
        n: f32,
        classes: Vec<f32>,
        scores: Vec<f32>,
        boxes: Vec<f32>,
    ) -> RawDetections {
        let max = classes.len();
        RawDetections::from_parts(
            Array1::from_vec(vec![n]),
            Array2::from_shape_vec((1, max), classes).unwrap(),
            Array2::from_shape_vec((1, max), scores).unwrap(),
            Array3::from_shape_vec((1, max, 4), boxes).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn denormalizes_against_original_size() {
        let raw = raw_single(
            1.,
            vec![1., 0.],
            vec![0.9, 0.],
            vec![0.1, 0.2, 0.5, 0.6, 0., 0., 0., 0.],
        );
        let out = decode_batch(&raw, &[ImageSize::new(100, 200)], &table(), 0.3);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 1);
        let bbox = out[0][0].bbox;
        assert_close(bbox.x_min, 20.);
        assert_close(bbox.y_min, 20.);
        assert_close(bbox.x_max, 60.);
        assert_close(bbox.y_max, 100.);
    }

    #[test]
    fn score_equal_to_threshold_is_kept() {
        let raw = raw_single(
            3.,
            vec![1., 2., 3.],
            vec![0.8, 0.3, 0.29999],
            vec![0.; 12],
        );
        let out = decode_batch(&raw, &[ImageSize::new(10, 10)], &table(), 0.3);
        let confidences: Vec<f32> = out[0].iter().map(|d| d.confidence).collect();
        assert_eq!(confidences, vec![0.8, 0.3]);
    }

    #[test]
    fn unknown_class_is_dropped_not_fatal() {
        let raw = raw_single(
            3.,
            vec![1., 42., 3.],
            vec![0.9, 0.9, 0.9],
            vec![0.; 12],
        );
        let out = decode_batch(&raw, &[ImageSize::new(10, 10)], &table(), 0.3);
        // exactly one fewer than the valid count, the rest untouched
        assert_eq!(out[0].len(), 2);
        assert_eq!(out[0][0].label, "person");
        assert_eq!(out[0][1].label, "car");
    }

    #[test]
    fn entries_beyond_count_are_never_read() {
        // poisoned tail: high-confidence known class past num_detections
        let raw = raw_single(
            1.,
            vec![1., 2.],
            vec![0.9, 0.99],
            vec![0.1, 0.1, 0.2, 0.2, 0.5, 0.5, 0.9, 0.9],
        );
        let out = decode_batch(&raw, &[ImageSize::new(10, 10)], &table(), 0.3);
        assert_eq!(out[0].len(), 1);
        assert_eq!(out[0][0].label, "person");
    }

    #[test]
    fn fractional_count_truncates() {
        let raw = raw_single(2.9, vec![1., 2., 3.], vec![0.9, 0.9, 0.9], vec![0.; 12]);
        let out = decode_batch(&raw, &[ImageSize::new(10, 10)], &table(), 0.3);
        assert_eq!(out[0].len(), 2);
    }

    #[test]
    fn zero_count_yields_empty_entry() {
        let raw = raw_single(0., vec![1.], vec![0.9], vec![0.; 4]);
        let out = decode_batch(&raw, &[ImageSize::new(10, 10)], &table(), 0.3);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_empty());
    }

    #[test]
    fn raw_order_is_preserved_within_an_image() {
        // ascending confidence order must survive: no sorting happens
        let raw = raw_single(
            3.,
            vec![1., 2., 3.],
            vec![0.4, 0.6, 0.9],
            vec![0.; 12],
        );
        let out = decode_batch(&raw, &[ImageSize::new(10, 10)], &table(), 0.3);
        let confidences: Vec<f32> = out[0].iter().map(|d| d.confidence).collect();
        assert_eq!(confidences, vec![0.4, 0.6, 0.9]);
    }

    #[test]
    fn overlapping_boxes_are_not_suppressed() {
        let raw = raw_single(
            2.,
            vec![1., 1.],
            vec![0.9, 0.8],
            vec![0.1, 0.1, 0.5, 0.5, 0.1, 0.1, 0.5, 0.5],
        );
        let out = decode_batch(&raw, &[ImageSize::new(100, 100)], &table(), 0.3);
        assert_eq!(out[0].len(), 2);
        assert_eq!(out[0][0].bbox, out[0][1].bbox);
    }
}
