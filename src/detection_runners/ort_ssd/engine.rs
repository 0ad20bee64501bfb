//! ONNX Runtime backend for SSD-style frozen detection graphs.

use std::collections::HashMap;
use std::path::Path;

use half::{bf16, f16};
use ndarray::{Array4, ArrayD, ArrayView4};
use parking_lot::Mutex;
use ort::{
    inputs, CPUExecutionProvider, CUDAExecutionProvider, ExecutionProvider,
    GraphOptimizationLevel, Session, SessionOutputs, TensorElementType,
    TensorRTExecutionProvider, ValueType,
};

use crate::common::{
    DetectorConfig, InferenceDevice, ROLE_DETECTION_BOXES, ROLE_DETECTION_CLASSES,
    ROLE_DETECTION_SCORES, ROLE_NUM_DETECTIONS,
};
use crate::data::RawDetections;
use crate::detection_runners::InferenceBackend;
use crate::error::DetectError;
use crate::utils;

/// One resolved output role: the underlying tensor plus its element type,
/// fixed at load so per-call extraction never re-resolves by string.
#[derive(Debug, Clone)]
struct RoleBinding {
    tensor_name: String,
    dtype: TensorElementType,
}

#[derive(Debug)]
struct TensorRoles {
    num_detections: RoleBinding,
    classes: RoleBinding,
    scores: RoleBinding,
    boxes: RoleBinding,
}

/// A loaded detection graph: session plus the validated role map.
///
/// Immutable once loaded. `Session::run` is serialized behind the mutex, so
/// overlapping `infer` calls from shared references are safe; decoding of a
/// returned batch always happens outside the lock.
#[derive(Debug)]
pub struct OrtSsdEngine {
    session: Mutex<Session>,
    image_tensor_name: String,
    image_dtype: TensorElementType,
    roles: TensorRoles,
}

impl OrtSsdEngine {
    /// Loads and validates a frozen graph. All-or-nothing: every
    /// configuration and artifact problem surfaces here, never later.
    ///
    /// Configuration and path checks run before any runtime initialization.
    pub fn load(config: &DetectorConfig) -> Result<Self, DetectError> {
        let num_name = required_role(&config.output_tensor_names, ROLE_NUM_DETECTIONS)?;
        let classes_name = required_role(&config.output_tensor_names, ROLE_DETECTION_CLASSES)?;
        let scores_name = required_role(&config.output_tensor_names, ROLE_DETECTION_SCORES)?;
        let boxes_name = required_role(&config.output_tensor_names, ROLE_DETECTION_BOXES)?;

        if config.image_tensor_name.is_empty() {
            return Err(DetectError::Configuration(
                "'image_tensor_name' is not set".to_string(),
            ));
        }

        let path = Path::new(&config.frozen_graph_path);
        if !path.is_file() {
            return Err(DetectError::ArtifactNotFound(format!(
                "frozen graph file does not exist: {}",
                config.frozen_graph_path
            )));
        }

        if config.ort_lib_path.is_empty() {
            ort::init().commit()?;
        } else {
            ort::init_from(&config.ort_lib_path).commit()?;
        }

        let builder = Session::builder()?;
        match config.inference_device {
            InferenceDevice::CUDA(device_id) => {
                let ep = CUDAExecutionProvider::default().with_device_id(device_id as i32);
                if let Err(err) = ep.register(&builder) {
                    log::warn!("CUDA execution provider unavailable ({err}), using CPU");
                }
            }
            InferenceDevice::TensorRT(device_id) => {
                let ep = TensorRTExecutionProvider::default().with_device_id(device_id as i32);
                if let Err(err) = ep.register(&builder) {
                    log::warn!("TensorRT execution provider unavailable ({err}), using CPU");
                }
            }
            InferenceDevice::CPU => {
                if let Err(err) = CPUExecutionProvider::default().register(&builder) {
                    log::warn!("CPU execution provider registration failed ({err})");
                }
            }
        }

        let session = builder
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(path)
            .map_err(|err| {
                DetectError::ArtifactNotFound(format!(
                    "cannot parse {} as an inference graph: {err}",
                    config.frozen_graph_path
                ))
            })?;

        let (image_tensor_name, image_dtype) =
            resolve_input(&session, &config.image_tensor_name)?;
        let roles = TensorRoles {
            num_detections: resolve_output(&session, ROLE_NUM_DETECTIONS, num_name)?,
            classes: resolve_output(&session, ROLE_DETECTION_CLASSES, classes_name)?,
            scores: resolve_output(&session, ROLE_DETECTION_SCORES, scores_name)?,
            boxes: resolve_output(&session, ROLE_DETECTION_BOXES, boxes_name)?,
        };

        let graph_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        log::info!(
            "Backend: ONNXRuntime | Device: {} | Graph: {} ({})",
            config.inference_device.str(),
            config.frozen_graph_path,
            utils::human_bytes(graph_bytes as f64),
        );

        let engine = Self {
            session: Mutex::new(session),
            image_tensor_name,
            image_dtype,
            roles,
        };

        // Warm up execution resources so the first real batch pays no setup cost.
        for _ in 0..config.num_dry_run {
            let blank = Array4::<f32>::zeros((
                1,
                config.model_height as usize,
                config.model_width as usize,
                3,
            ));
            engine.infer(blank.view())?;
        }

        Ok(engine)
    }

    /// Fetches a custom metadata entry from the loaded graph, e.g. an
    /// embedded `names` class dictionary.
    pub fn try_fetch(&self, key: &str) -> Option<String> {
        let session = self.session.lock();
        let fetched = match session.metadata() {
            Err(_) => None,
            Ok(metadata) => metadata.custom(key).unwrap_or_default(),
        };
        fetched
    }
}

impl InferenceBackend for OrtSsdEngine {
    fn infer(&self, batch: ArrayView4<f32>) -> Result<RawDetections, DetectError> {
        let session = self.session.lock();
        let input_name = self.image_tensor_name.as_str();

        // Session inputs carry whatever element type the graph declares;
        // the stacked batch is converted once per call.
        let outputs = match self.image_dtype {
            TensorElementType::Float32 => session.run(inputs![input_name => batch]?)?,
            TensorElementType::Uint8 => {
                let converted = batch.mapv(|v| v as u8);
                session.run(inputs![input_name => converted.view()]?)?
            }
            TensorElementType::Float16 => {
                let converted = batch.mapv(f16::from_f32);
                session.run(inputs![input_name => converted.view()]?)?
            }
            other => {
                return Err(DetectError::Configuration(format!(
                    "unsupported image tensor element type: {other:?}"
                )))
            }
        };

        let num_detections = extract_f32(&outputs, &self.roles.num_detections)?;
        let classes = extract_f32(&outputs, &self.roles.classes)?;
        let scores = extract_f32(&outputs, &self.roles.scores)?;
        let boxes = extract_f32(&outputs, &self.roles.boxes)?;

        RawDetections::from_dyn(num_detections, classes, scores, boxes)
    }
}

fn required_role(map: &HashMap<String, String>, role: &str) -> Result<String, DetectError> {
    match map.get(role) {
        Some(name) if !name.is_empty() => Ok(name.clone()),
        Some(_) => Err(DetectError::Configuration(format!(
            "'output_tensor_names' maps role '{role}' to an empty tensor identifier"
        ))),
        None => Err(DetectError::Configuration(format!(
            "'output_tensor_names' is missing required role '{role}'"
        ))),
    }
}

fn resolve_input(
    session: &Session,
    tensor_name: &str,
) -> Result<(String, TensorElementType), DetectError> {
    let input = session
        .inputs
        .iter()
        .find(|input| input.name == tensor_name)
        .ok_or_else(|| {
            DetectError::Configuration(format!(
                "image tensor '{}' not present in graph inputs ({})",
                tensor_name,
                session
                    .inputs
                    .iter()
                    .map(|i| i.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ))
        })?;

    match &input.input_type {
        ValueType::Tensor { ty, .. } => Ok((input.name.clone(), *ty)),
        other => Err(DetectError::Configuration(format!(
            "graph input '{tensor_name}' is not a tensor: {other:?}"
        ))),
    }
}

fn resolve_output(
    session: &Session,
    role: &str,
    tensor_name: String,
) -> Result<RoleBinding, DetectError> {
    let output = session
        .outputs
        .iter()
        .find(|output| output.name == tensor_name)
        .ok_or_else(|| {
            DetectError::Configuration(format!(
                "tensor '{}' for role '{}' not present in graph outputs ({})",
                tensor_name,
                role,
                session
                    .outputs
                    .iter()
                    .map(|o| o.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ))
        })?;

    match &output.output_type {
        ValueType::Tensor { ty, .. } => Ok(RoleBinding {
            tensor_name,
            dtype: *ty,
        }),
        other => Err(DetectError::Configuration(format!(
            "graph output '{tensor_name}' is not a tensor: {other:?}"
        ))),
    }
}

fn extract_f32(
    outputs: &SessionOutputs,
    binding: &RoleBinding,
) -> Result<ArrayD<f32>, DetectError> {
    let value = &outputs[binding.tensor_name.as_str()];
    let array = match binding.dtype {
        TensorElementType::Float32 => value.try_extract_tensor::<f32>()?.to_owned(),
        TensorElementType::Float16 => value.try_extract_tensor::<f16>()?.mapv(f16::to_f32),
        TensorElementType::Bfloat16 => value.try_extract_tensor::<bf16>()?.mapv(bf16::to_f32),
        TensorElementType::Float64 => value.try_extract_tensor::<f64>()?.mapv(|v| v as f32),
        TensorElementType::Int64 => value.try_extract_tensor::<i64>()?.mapv(|v| v as f32),
        TensorElementType::Int32 => value.try_extract_tensor::<i32>()?.mapv(|v| v as f32),
        TensorElementType::Uint8 => value.try_extract_tensor::<u8>()?.mapv(|v| v as f32),
        other => {
            return Err(DetectError::MalformedOutput(format!(
                "unsupported element type {:?} on output tensor '{}'",
                other, binding.tensor_name
            )))
        }
    };
    Ok(array)
}
