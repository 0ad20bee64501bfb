mod raw_detections;

pub use raw_detections::RawDetections;
