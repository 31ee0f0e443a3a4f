use ort::Error as OrtError;

use crate::model_manager::ModelError;

/// Represents the different types of errors that can occur in the image classifier.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClassifierError {
    /// The model file is missing, fails verification, or does not match the expected topology
    #[error("Load error: {0}")]
    LoadError(String),
    /// The uploaded bytes are not a decodable image
    #[error("Decode error: {0}")]
    DecodeError(String),
    /// The forward pass failed or produced unusable output
    #[error("Inference error: {0}")]
    InferenceError(String),
    /// The classifier was configured with invalid parameters
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::LoadError(err.to_string())
    }
}

impl From<ModelError> for ClassifierError {
    fn from(err: ModelError) -> Self {
        ClassifierError::LoadError(err.to_string())
    }
}

impl From<image::ImageError> for ClassifierError {
    fn from(err: image::ImageError) -> Self {
        ClassifierError::DecodeError(err.to_string())
    }
}
