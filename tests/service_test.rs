mod common;

use std::sync::Arc;

use anime_lens::{
    Classifier, ClassifierError, MetadataField, MetadataIndex, PredictionService, ServiceError,
    ANIME_TITLES,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common::{anime_classifier, png_bytes, FixedBackend, DATASET};

fn service_with(classifier: Classifier) -> PredictionService {
    let index = MetadataIndex::from_reader(DATASET.as_bytes(), classifier.labels());
    PredictionService::new(Some(Arc::new(classifier)), Arc::new(index))
}

/// Scores that make `ANIME_TITLES[winner]` the clear favourite
fn favouring(winner: usize) -> Vec<f32> {
    (0..ANIME_TITLES.len())
        .map(|i| if i == winner { 5.0 } else { 0.0 })
        .collect()
}

#[test]
fn test_report_joins_metadata_for_top_title() -> Result<(), Box<dyn std::error::Error>> {
    common::init();
    let classifier = Classifier::builder()
        .with_backend(Arc::new(FixedBackend(favouring(8))))
        .build()?;
    let service = service_with(classifier);

    let bytes = png_bytes(80, 60);
    let report = service.recognize("frame.PNG", &bytes)?;

    assert_eq!(report.anime_title, "Death Note");
    assert_eq!(report.metadata.get(MetadataField::Studio), Some("Madhouse"));
    assert_eq!(report.image_mime, "image/png");
    assert_eq!(STANDARD.decode(&report.image_base64)?, bytes);
    assert!(report.image_data_uri().starts_with("data:image/png;base64,"));

    // e^5 / (e^5 + 29)
    let expected = 5f32.exp() / (5f32.exp() + 29.0);
    assert!((report.confidence - expected).abs() < 1e-5);
    assert_eq!(report.confidence_display, format!("{:.2}%", expected * 100.0));

    assert_eq!(report.other_predictions.len(), ANIME_TITLES.len() - 1);
    assert!(report.other_predictions.iter().all(|p| p.label != "Death Note"));
    assert!(report.other_predictions.iter().all(|p| p.confidence <= report.confidence));
    Ok(())
}

#[test]
fn test_report_without_metadata() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = Classifier::builder()
        .with_backend(Arc::new(FixedBackend(favouring(19))))
        .build()?;
    let service = service_with(classifier);

    let report = service.recognize("nichijou.jpeg", &png_bytes(40, 40))?;
    assert_eq!(report.anime_title, "Nichijou");
    assert!(report.metadata.is_empty());
    assert_eq!(report.image_mime, "image/jpeg");
    Ok(())
}

#[test]
fn test_report_serializes_for_json_clients() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = Classifier::builder()
        .with_backend(Arc::new(FixedBackend(favouring(3))))
        .build()?;
    let report = service_with(classifier).recognize("titan.gif", &png_bytes(40, 40))?;

    let json = serde_json::to_value(&report)?;
    assert_eq!(json["anime_title"], "Attack on Titan");
    assert_eq!(json["metadata"]["identifier"], "16498");
    assert_eq!(json["image_mime"], "image/gif");
    assert_eq!(json["other_predictions"].as_array().map(Vec::len), Some(29));
    Ok(())
}

#[test]
fn test_extension_is_checked_before_model_availability() {
    let service = PredictionService::new(None, Arc::new(MetadataIndex::default()));
    assert!(matches!(
        service.recognize("notes.txt", b"hello"),
        Err(ServiceError::UnsupportedExtension(_))
    ));
    assert!(matches!(service.recognize("shot.jpg", b"hello"), Err(ServiceError::Unavailable)));
}

#[test]
fn test_suffix_check_does_not_sniff_content() {
    let service = service_with(anime_classifier());
    let result = service.recognize("looks_fine.png", b"GIF89a but actually garbage");
    assert!(matches!(
        result,
        Err(ServiceError::Classifier(ClassifierError::DecodeError(_)))
    ));

    // The service keeps working after a failed request
    assert!(service.recognize("next.png", &png_bytes(30, 30)).is_ok());
}

#[test]
fn test_error_messages() {
    let err = ServiceError::from(ClassifierError::DecodeError("bad header".into()));
    assert_eq!(err.to_string(), "An error occurred during prediction: Decode error: bad header");
}
