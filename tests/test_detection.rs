use std::time::Instant;

use anyhow::Context;
use image::GenericImageView;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use ssd_detect::{DetectorConfig, ImageBatch, InferenceDevice};


/// End-to-end run against a real exported SSD graph. Needs model artifacts
/// that do not ship with the repo, so it only runs when asked for:
///
///   SSD_DETECT_GRAPH=../models/ssd_mobilenet/frozen_inference_graph.onnx \
///   SSD_DETECT_ORT_LIB=../onnxruntime/linux_x64/libonnxruntime.so \
///   SSD_DETECT_LABELS=../models/coco_labels.txt \
///   SSD_DETECT_IMAGE=tests/8_people.jpg \
///   cargo test --test test_detection -- --ignored
#[test]
#[ignore]
fn detection() -> anyhow::Result<()> {
    /////////////////////
    // Testing variables
    let loop_count: u32 = 3;
    let graph_path = std::env::var("SSD_DETECT_GRAPH").context("SSD_DETECT_GRAPH not set")?;
    let lib_path = std::env::var("SSD_DETECT_ORT_LIB").unwrap_or_default();
    let labels_path = std::env::var("SSD_DETECT_LABELS").context("SSD_DETECT_LABELS not set")?;
    let image_path = std::env::var("SSD_DETECT_IMAGE").context("SSD_DETECT_IMAGE not set")?;
    /////////////////////

    let config = DetectorConfig::new()
        .with_frozen_graph(&graph_path)
        .with_ort_lib_path(&lib_path)
        .with_labels_path(&labels_path)
        .with_image_tensor_name("image_tensor")
        .with_standard_output_tensors()
        .with_conf_threshold(0.3)
        .with_device(InferenceDevice::CPU)
        .with_model_size(300, 300)
        .with_dry_run(1);

    let detector = ssd_detect::load_detector(&config)?;

    let image = image::open(&image_path)?;
    let (img_width, img_height) = image.dimensions();
    println!("Input image: {}x{}", img_width, img_height);

    let batch = ImageBatch::from_originals(&[image.to_rgb8()], 300, 300);

    let now = Instant::now();
    let mut elapsed = now.elapsed();

    for count in 0..loop_count {
        let result = detector.detect_batch(&batch)?;
        assert_eq!(result.len(), 1);

        if count == 0 {
            let mut img = image.to_rgb8();
            for detection in &result[0] {
                let (x, y, w, h) = detection.bbox.as_xy_wh_i32();
                let rect = Rect::at(x, y).of_size(w.max(1) as u32, h.max(1) as u32);
                draw_hollow_rect_mut(&mut img, rect, colours::get_label_colour(&detection.label));
                println!("{}", detection);
            }
            img.save("tests/test_output.jpg")?;
        }

        println!(
            "TIME | Total={:.2?} | {}th detection={:.2?}",
            now.elapsed(),
            count,
            now.elapsed() - elapsed
        );
        println!("Detected {} objects\n", result[0].len());
        elapsed = now.elapsed();
    }

    Ok(())
}
