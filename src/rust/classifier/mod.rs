use serde::Serialize;

mod backend;
pub mod builder;
#[allow(clippy::module_inception)]
mod classifier;
mod error;
pub mod preprocess;
pub mod utils;

pub use backend::{InferenceBackend, OnnxBackend};
pub use builder::ClassifierBuilder;
pub use classifier::Classifier;
pub use error::ClassifierError;

use crate::runtime::Device;

/// One class label with the probability the model assigned to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// The class label
    pub label: String,
    /// Softmax probability in `[0, 1]`
    pub confidence: f32,
}

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file, if the classifier was loaded from one
    pub model_path: Option<String>,
    /// Device the forward pass runs on
    pub device: Device,
    /// Number of classes the classifier predicts
    pub num_classes: usize,
    /// Labels of the classes in model-output order
    pub class_labels: Vec<String>,
}
