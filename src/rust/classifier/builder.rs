use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info};
use ort::session::Session;
use ort::value::ValueType;

use super::backend::{InferenceBackend, OnnxBackend};
use super::classifier::Classifier;
use super::error::ClassifierError;
use super::preprocess::PreprocessConfig;
use crate::model_manager::ModelManager;
use crate::models::{BuiltinModel, ModelCharacteristics};
use crate::runtime::{create_session_builder, ensure_initialized, RuntimeConfig};

/// A builder for constructing a Classifier with a fluent interface.
#[derive(Debug)]
pub struct ClassifierBuilder {
    model: BuiltinModel,
    model_path: Option<PathBuf>,
    expected_sha256: Option<String>,
    labels: Vec<String>,
    backend: Option<Arc<dyn InferenceBackend>>,
    runtime_config: RuntimeConfig,
}

impl Default for ClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierBuilder {
    /// Creates a builder for the built-in anime title model with its default labels
    ///
    /// # Example
    /// ```
    /// use anime_lens::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        let model = BuiltinModel::AnimeResNet50;
        Self {
            model,
            model_path: None,
            expected_sha256: None,
            labels: model.labels().iter().map(|label| label.to_string()).collect(),
            backend: None,
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Sets the runtime configuration for ONNX model execution
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Sets the path of the exported ONNX model to load at build time
    pub fn with_model_path(mut self, path: impl AsRef<Path>) -> Self {
        self.model_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Requires the model file to have this SHA-256 digest (hex)
    pub fn with_checksum(mut self, sha256: impl Into<String>) -> Self {
        self.expected_sha256 = Some(sha256.into());
        self
    }

    /// Replaces the class labels. Order must match the model's output units.
    ///
    /// # Errors
    /// - `ValidationError` if the list is empty, or a label is empty or repeated
    pub fn with_labels(mut self, labels: Vec<impl Into<String>>) -> Result<Self, ClassifierError> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        Self::validate_labels(&labels)?;
        self.labels = labels;
        Ok(self)
    }

    /// Uses a custom inference backend instead of loading an ONNX model.
    ///
    /// The backend must produce one score per label.
    pub fn with_backend(mut self, backend: Arc<dyn InferenceBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    fn validate_labels(labels: &[String]) -> Result<(), ClassifierError> {
        if labels.is_empty() {
            return Err(ClassifierError::ValidationError(
                "At least one class label is required".into(),
            ));
        }
        if let Some(pos) = labels.iter().position(|label| label.is_empty()) {
            return Err(ClassifierError::ValidationError(format!(
                "Label {} cannot be empty",
                pos + 1
            )));
        }
        let mut seen = HashSet::new();
        if let Some(label) = labels.iter().find(|label| !seen.insert(label.as_str())) {
            return Err(ClassifierError::ValidationError(format!("Duplicate label '{}'", label)));
        }
        Ok(())
    }

    /// Builds and returns the final Classifier instance
    ///
    /// # Returns
    /// * `Result<Classifier, ClassifierError>` - The constructed Classifier, or an error if:
    ///   - Neither a model path nor a backend is set (`ValidationError`)
    ///   - The model file is missing or fails checksum verification (`LoadError`)
    ///   - The model graph does not match the expected topology (`LoadError`)
    ///
    /// # Example
    /// ```no_run
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use anime_lens::ClassifierBuilder;
    ///
    /// let classifier = ClassifierBuilder::new()
    ///     .with_model_path("models/trained_resnet50_final.onnx")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<Classifier, ClassifierError> {
        let characteristics = self.model.characteristics();
        let preprocess = PreprocessConfig::from(&characteristics);

        if let Some(backend) = self.backend {
            return Ok(Classifier {
                model_path: None,
                backend,
                labels: Arc::new(self.labels),
                preprocess,
            });
        }

        let model_path = self
            .model_path
            .ok_or_else(|| ClassifierError::ValidationError("Model path must be set".into()))?;

        ModelManager::verify_file(&model_path, self.expected_sha256.as_deref()).map_err(|e| {
            error!("Failed to verify model file: {}", e);
            ClassifierError::from(e)
        })?;

        ensure_initialized().map_err(ClassifierError::LoadError)?;
        let (session_builder, device) = create_session_builder(&self.runtime_config)?;
        let session = session_builder.commit_from_file(&model_path).map_err(|e| {
            error!("Failed to load model from {:?}: {}", model_path, e);
            ClassifierError::LoadError(format!("Failed to load model: {}", e))
        })?;

        Self::validate_model(&session, &characteristics, self.labels.len())?;
        info!(
            "Model structure validated successfully ({} classes, device: {})",
            self.labels.len(),
            device
        );

        Ok(Classifier {
            model_path: Some(model_path.to_string_lossy().to_string()),
            backend: Arc::new(OnnxBackend::new(session, device)?),
            labels: Arc::new(self.labels),
            preprocess,
        })
    }

    /// Validates that the model has the expected input/output structure
    ///
    /// # Returns
    /// * `Result<(), ClassifierError>` - Ok if validation passes, or a `LoadError` if:
    ///   - The model does not have exactly one image input of shape `[N, 3, size, size]`
    ///   - The model has no outputs, or its class dimension differs from `num_classes`
    fn validate_model(
        session: &Session,
        characteristics: &ModelCharacteristics,
        num_classes: usize,
    ) -> Result<(), ClassifierError> {
        let inputs = &session.inputs;
        if inputs.len() != 1 {
            return Err(ClassifierError::LoadError(format!(
                "Model must have exactly 1 image input, found {}",
                inputs.len()
            )));
        }
        if let ValueType::Tensor { dimensions, .. } = &inputs[0].input_type {
            check_input_dimensions(dimensions, characteristics.input_size)?;
        }

        let outputs = &session.outputs;
        let Some(output) = outputs.first() else {
            return Err(ClassifierError::LoadError(
                "Model must have at least 1 output for class scores".into(),
            ));
        };
        if let ValueType::Tensor { dimensions, .. } = &output.output_type {
            check_output_dimensions(dimensions, num_classes)?;
        }

        Ok(())
    }
}

/// Dimensions of -1 (or 0) are dynamic and accept any size.
fn dimension_matches(actual: i64, expected: i64) -> bool {
    actual <= 0 || actual == expected
}

pub(crate) fn check_input_dimensions(
    dimensions: &[i64],
    input_size: u32,
) -> Result<(), ClassifierError> {
    let size = i64::from(input_size);
    let expected = [1, 3, size, size];
    let matches = dimensions.len() == expected.len()
        && dimensions
            .iter()
            .zip(expected)
            .all(|(&actual, want)| dimension_matches(actual, want));
    if !matches {
        return Err(ClassifierError::LoadError(format!(
            "Model input shape {:?} does not match [N, 3, {}, {}]",
            dimensions, input_size, input_size
        )));
    }
    Ok(())
}

pub(crate) fn check_output_dimensions(
    dimensions: &[i64],
    num_classes: usize,
) -> Result<(), ClassifierError> {
    let classes = dimensions.last().copied().unwrap_or(-1);
    if !dimension_matches(classes, num_classes as i64) {
        return Err(ClassifierError::LoadError(format!(
            "Model outputs {} classes but {} labels are configured",
            classes, num_classes
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_dimensions() {
        assert!(check_input_dimensions(&[1, 3, 224, 224], 224).is_ok());
        assert!(check_input_dimensions(&[-1, 3, 224, 224], 224).is_ok());
        assert!(check_input_dimensions(&[-1, 3, -1, -1], 224).is_ok());
        assert!(check_input_dimensions(&[2, 3, 224, 224], 224).is_err());
        assert!(check_input_dimensions(&[1, 1, 224, 224], 224).is_err());
        assert!(check_input_dimensions(&[1, 3, 299, 299], 224).is_err());
        assert!(check_input_dimensions(&[1, 224, 224, 3], 224).is_err());
        assert!(check_input_dimensions(&[3, 224, 224], 224).is_err());
    }

    #[test]
    fn test_output_dimensions() {
        assert!(check_output_dimensions(&[1, 30], 30).is_ok());
        assert!(check_output_dimensions(&[-1, 30], 30).is_ok());
        assert!(check_output_dimensions(&[-1, -1], 30).is_ok());
        assert!(matches!(
            check_output_dimensions(&[1, 1000], 30),
            Err(ClassifierError::LoadError(_))
        ));
    }

    #[test]
    fn test_label_validation() {
        assert!(ClassifierBuilder::new().with_labels(Vec::<String>::new()).is_err());
        assert!(ClassifierBuilder::new().with_labels(vec!["a", ""]).is_err());
        assert!(matches!(
            ClassifierBuilder::new().with_labels(vec!["a", "b", "a"]),
            Err(ClassifierError::ValidationError(_))
        ));
        assert!(ClassifierBuilder::new().with_labels(vec!["a", "b"]).is_ok());
    }

    #[test]
    fn test_build_without_model_path() {
        let result = ClassifierBuilder::new().build();
        assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
    }
}
