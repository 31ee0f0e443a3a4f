use std::fmt::Debug;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use super::error::ClassifierError;
use crate::runtime::Device;

/// Runs the network on a preprocessed image.
///
/// The input is a normalized NCHW batch holding one image (`[1, 3, 224, 224]`).
/// Implementations return the raw, pre-softmax score of every class in
/// model-output order and must be deterministic for identical input.
pub trait InferenceBackend: Debug + Send + Sync {
    /// Runs a single forward pass
    ///
    /// # Errors
    /// - `InferenceError` if execution fails or the output cannot be read
    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError>;

    /// The device the forward pass runs on
    fn device(&self) -> Device {
        Device::Cpu
    }
}

/// Forward pass through an ONNX Runtime session.
///
/// The exported graph is inference-only: dropout is an identity and no
/// gradients are tracked, so every run is side-effect free.
#[derive(Debug)]
pub struct OnnxBackend {
    session: Session,
    input_name: String,
    device: Device,
}

impl OnnxBackend {
    pub(crate) fn new(session: Session, device: Device) -> Result<Self, ClassifierError> {
        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| ClassifierError::LoadError("Model has no inputs".into()))?;
        Ok(Self {
            session,
            input_name,
            device,
        })
    }
}

impl InferenceBackend for OnnxBackend {
    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        let input_dyn = input.into_dyn();
        let pixels = input_dyn.as_standard_layout();
        let tensor = Tensor::from_array(&pixels).map_err(|e| {
            ClassifierError::InferenceError(format!("Failed to create input tensor: {}", e))
        })?;

        let outputs = self
            .session
            .run(vec![(self.input_name.as_str(), tensor)])
            .map_err(|e| ClassifierError::InferenceError(format!("Failed to run model: {}", e)))?;
        let scores = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                ClassifierError::InferenceError(format!("Failed to extract output tensor: {}", e))
            })?;

        Ok(scores.iter().copied().collect())
    }

    fn device(&self) -> Device {
        self.device
    }
}
