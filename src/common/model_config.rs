use std::collections::HashMap;

/// Semantic output roles every SSD-style detection graph must expose.
pub const ROLE_NUM_DETECTIONS: &str = "num_detections";
pub const ROLE_DETECTION_CLASSES: &str = "detection_classes";
pub const ROLE_DETECTION_SCORES: &str = "detection_scores";
pub const ROLE_DETECTION_BOXES: &str = "detection_boxes";

pub(crate) const ALL_ROLES: [&str; 4] = [
    ROLE_NUM_DETECTIONS,
    ROLE_DETECTION_CLASSES,
    ROLE_DETECTION_SCORES,
    ROLE_DETECTION_BOXES,
];

#[derive(Debug, Default, Clone, Copy)]
pub enum InferenceDevice {
    #[default]
    CPU,
    CUDA(usize),
    TensorRT(usize),
}

impl InferenceDevice {
    pub fn from_str(device: &str, device_id: usize) -> Option<Self> {
        match device.to_lowercase().as_str() {
            "cpu" => Some(InferenceDevice::CPU),
            "cuda" => Some(InferenceDevice::CUDA(device_id)),
            "tensorrt" => Some(InferenceDevice::TensorRT(device_id)),
            _ => None,
        }
    }

    pub fn str(&self) -> &'static str {
        match self {
            InferenceDevice::CPU => "CPU",
            InferenceDevice::CUDA(_) => "CUDA",
            InferenceDevice::TensorRT(_) => "TensorRT",
        }
    }
}

/// Configuration for loading a frozen detection graph.
///
/// `frozen_graph_path`, `image_tensor_name` and all four entries of
/// `output_tensor_names` are required; loading fails with a configuration
/// error when any is missing or does not resolve against the graph.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub frozen_graph_path: String,
    pub ort_lib_path: String,
    pub labels_path: Option<String>,
    pub image_tensor_name: String,
    pub output_tensor_names: HashMap<String, String>,
    pub conf_threshold: f32,
    pub inference_device: InferenceDevice,
    pub model_width: u32,
    pub model_height: u32,
    pub num_dry_run: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            frozen_graph_path: String::new(),
            ort_lib_path: String::new(),
            labels_path: None,
            image_tensor_name: String::new(),
            output_tensor_names: HashMap::new(),
            conf_threshold: 0.3,
            inference_device: InferenceDevice::CPU,
            // SSD300 input resolution
            model_width: 300,
            model_height: 300,
            num_dry_run: 0,
        }
    }
}

impl DetectorConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_frozen_graph(mut self, path: &str) -> Self {
        self.frozen_graph_path = path.to_string();
        self
    }

    pub fn with_ort_lib_path(mut self, path: &str) -> Self {
        self.ort_lib_path = path.to_string();
        self
    }

    pub fn with_labels_path(mut self, path: &str) -> Self {
        self.labels_path = Some(path.to_string());
        self
    }

    pub fn with_image_tensor_name(mut self, name: &str) -> Self {
        self.image_tensor_name = name.to_string();
        self
    }

    pub fn with_output_tensor_name(mut self, role: &str, tensor: &str) -> Self {
        self.output_tensor_names
            .insert(role.to_string(), tensor.to_string());
        self
    }

    /// Maps all four roles to the tensor names a stock exported SSD graph uses,
    /// i.e. each role name is also the tensor identifier.
    pub fn with_standard_output_tensors(mut self) -> Self {
        for role in ALL_ROLES {
            self.output_tensor_names
                .insert(role.to_string(), role.to_string());
        }
        self
    }

    pub fn with_conf_threshold(mut self, threshold: f32) -> Self {
        self.conf_threshold = threshold;
        self
    }

    pub fn with_device(mut self, device: InferenceDevice) -> Self {
        self.inference_device = device;
        self
    }

    pub fn with_model_size(mut self, width: u32, height: u32) -> Self {
        self.model_width = width;
        self.model_height = height;
        self
    }

    pub fn with_dry_run(mut self, n: usize) -> Self {
        self.num_dry_run = n;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threshold_is_0_3() {
        assert_eq!(DetectorConfig::default().conf_threshold, 0.3);
    }

    #[test]
    fn standard_output_tensors_cover_all_roles() {
        let config = DetectorConfig::new().with_standard_output_tensors();
        for role in ALL_ROLES {
            assert_eq!(config.output_tensor_names.get(role).map(String::as_str), Some(role));
        }
    }
}
