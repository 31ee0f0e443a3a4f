use std::sync::Arc;

use image::{DynamicImage, GenericImageView};
use ndarray::Array1;

use super::backend::InferenceBackend;
use super::error::ClassifierError;
use super::preprocess::{preprocess_image, PreprocessConfig};
use super::utils::{rank_predictions, softmax};
use super::{ClassifierInfo, Prediction};

/// A thread-safe image classifier over a fixed, ordered set of class labels.
///
/// # Thread Safety
///
/// The classifier is `Send + Sync`: the backend and labels are behind `Arc`
/// and never mutated after construction, so one instance can serve every
/// request concurrently.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use anime_lens::Classifier;
///
/// let classifier = Classifier::builder()
///     .with_model_path("models/trained_resnet50_final.onnx")
///     .build()?;
///
/// let bytes = std::fs::read("screenshot.png")?;
/// for prediction in classifier.predict(&bytes)?.iter().take(3) {
///     println!("{}: {:.2}%", prediction.label, prediction.confidence * 100.0);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Classifier {
    pub(crate) model_path: Option<String>,
    pub(crate) backend: Arc<dyn InferenceBackend>,
    pub(crate) labels: Arc<Vec<String>>,
    pub(crate) preprocess: PreprocessConfig,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            model_path: self.model_path.clone(),
            device: self.backend.device(),
            num_classes: self.labels.len(),
            class_labels: self.labels.as_ref().clone(),
        }
    }

    /// Class labels in model-output order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Classifies encoded image bytes (PNG, JPEG, GIF, ...).
    ///
    /// Returns one prediction per class, sorted by descending confidence.
    /// Confidences are softmax probabilities and sum to 1.
    ///
    /// # Errors
    /// - `DecodeError` if the bytes are empty or not a decodable image
    /// - `InferenceError` if the forward pass fails
    pub fn predict(&self, image_bytes: &[u8]) -> Result<Vec<Prediction>, ClassifierError> {
        if image_bytes.is_empty() {
            return Err(ClassifierError::DecodeError("Image data cannot be empty".into()));
        }
        let image = image::load_from_memory(image_bytes)?;
        self.predict_image(&image)
    }

    /// Classifies an already decoded image.
    pub fn predict_image(&self, image: &DynamicImage) -> Result<Vec<Prediction>, ClassifierError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ClassifierError::DecodeError(format!(
                "Image has no pixels ({}x{})",
                width, height
            )));
        }

        let input = preprocess_image(image, &self.preprocess)?;
        let scores = self.backend.forward(input)?;

        if scores.len() != self.labels.len() {
            return Err(ClassifierError::InferenceError(format!(
                "Model produced {} scores for {} classes",
                scores.len(),
                self.labels.len()
            )));
        }
        if scores.iter().any(|score| !score.is_finite()) {
            return Err(ClassifierError::InferenceError(
                "Model produced non-finite scores".into(),
            ));
        }

        let probabilities = softmax(&Array1::from_vec(scores));
        Ok(rank_predictions(&self.labels, &probabilities))
    }

    /// Returns only the most likely label and its confidence.
    pub fn predict_top(&self, image_bytes: &[u8]) -> Result<Prediction, ClassifierError> {
        self.predict(image_bytes)?
            .into_iter()
            .next()
            .ok_or_else(|| ClassifierError::InferenceError("Model produced no predictions".into()))
    }
}
