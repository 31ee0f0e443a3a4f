use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, info};
use serde::Serialize;

use crate::classifier::{Classifier, ClassifierError, Prediction};
use crate::metadata::{MetadataIndex, MetadataRecord};

/// Upload extensions accepted by the front-end.
///
/// Only the filename suffix is checked, the bytes are not sniffed. A file with
/// an allowed name but other content fails later with a decode error.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Returns the lowercased extension if `filename` ends in an allowed one
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, extension) = filename.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&extension.as_str()).then_some(extension)
}

pub fn allowed_file(filename: &str) -> bool {
    allowed_extension(filename).is_some()
}

fn mime_for_extension(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "gif" => "image/gif",
        _ => "image/jpeg",
    }
}

/// Confidence as a percentage with two decimals, e.g. `97.12%`
pub fn format_confidence(confidence: f32) -> String {
    format!("{:.2}%", f64::from(confidence) * 100.0)
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("No file was uploaded")]
    MissingFile,
    #[error("Unsupported file type: {0}")]
    UnsupportedExtension(String),
    #[error("Model not loaded. Please check server logs.")]
    Unavailable,
    #[error("An error occurred during prediction: {0}")]
    Classifier(#[from] ClassifierError),
}

/// Everything the presentation layer needs to show one result.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    /// Most likely title
    pub anime_title: String,
    /// Probability of the top title in `[0, 1]`
    pub confidence: f32,
    /// `confidence` as a percentage with two decimals
    pub confidence_display: String,
    /// Dataset metadata for the top title; empty when the dataset has none
    pub metadata: MetadataRecord,
    /// The uploaded bytes, base64 encoded for redisplay
    pub image_base64: String,
    /// MIME type derived from the upload's extension
    pub image_mime: String,
    /// The remaining titles, most likely first
    pub other_predictions: Vec<Prediction>,
}

impl PredictionReport {
    /// `data:` URI for embedding the uploaded image in a page
    pub fn image_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.image_mime, self.image_base64)
    }
}

/// Joins classifier output with dataset metadata for one upload at a time.
///
/// A service without a classifier is in the degraded state left behind by a
/// failed model load: it stays up and rejects every prediction.
#[derive(Debug, Clone)]
pub struct PredictionService {
    classifier: Option<Arc<Classifier>>,
    index: Arc<MetadataIndex>,
}

impl PredictionService {
    pub fn new(classifier: Option<Arc<Classifier>>, index: Arc<MetadataIndex>) -> Self {
        Self { classifier, index }
    }

    pub fn is_available(&self) -> bool {
        self.classifier.is_some()
    }

    /// Classifies one uploaded file and assembles the result.
    ///
    /// # Errors
    /// - `MissingFile` if the filename is empty
    /// - `UnsupportedExtension` if the filename does not end in an allowed extension
    /// - `Unavailable` if no model is loaded
    /// - `Classifier` if decoding or inference fails
    pub fn recognize(
        &self,
        filename: &str,
        image_bytes: &[u8],
    ) -> Result<PredictionReport, ServiceError> {
        if filename.is_empty() {
            return Err(ServiceError::MissingFile);
        }
        let extension = allowed_extension(filename)
            .ok_or_else(|| ServiceError::UnsupportedExtension(filename.to_string()))?;
        let classifier = self.classifier.as_ref().ok_or(ServiceError::Unavailable)?;

        let start = std::time::Instant::now();
        let mut predictions = classifier.predict(image_bytes)?.into_iter();
        let top = predictions.next().ok_or_else(|| {
            ClassifierError::InferenceError("Model produced no predictions".into())
        })?;
        debug!("Classified {} in {:.2?}", filename, start.elapsed());

        let metadata = self.index.lookup(&top.label).clone();
        info!(
            "Predicted '{}' ({}) for {}{}",
            top.label,
            format_confidence(top.confidence),
            filename,
            if metadata.is_empty() { ", no metadata" } else { "" }
        );

        Ok(PredictionReport {
            confidence_display: format_confidence(top.confidence),
            anime_title: top.label,
            confidence: top.confidence,
            metadata,
            image_base64: STANDARD.encode(image_bytes),
            image_mime: mime_for_extension(&extension).to_string(),
            other_predictions: predictions.collect(),
        })
    }
}
