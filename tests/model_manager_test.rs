use anime_lens::{BuiltinModel, ModelError, ModelManager};

// SHA-256 of the bytes "hello world"
const HELLO_WORLD_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

#[test]
fn test_model_presence() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempfile::tempdir()?;
    let manager = ModelManager::new(root.path());
    assert!(!manager.is_model_present(BuiltinModel::AnimeResNet50));

    let model_path = manager.get_model_path(BuiltinModel::AnimeResNet50);
    std::fs::create_dir_all(model_path.parent().ok_or("model path has no parent")?)?;
    std::fs::write(&model_path, b"weights")?;
    assert!(manager.is_model_present(BuiltinModel::AnimeResNet50));
    Ok(())
}

#[test]
fn test_model_paths() {
    let manager = ModelManager::new("/srv/anime-lens");
    let model_path = manager.get_model_path(BuiltinModel::AnimeResNet50);
    let dataset_path = manager.get_dataset_path(BuiltinModel::AnimeResNet50);

    assert!(model_path.ends_with("models/trained_resnet50_final.onnx"));
    assert!(dataset_path.ends_with("data/anime.csv"));
    assert!(model_path.starts_with(manager.root()));
}

#[test]
fn test_model_verification() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempfile::tempdir()?;
    let path = root.path().join("model.onnx");
    std::fs::write(&path, b"hello world")?;

    assert_eq!(ModelManager::sha256_file(&path)?, HELLO_WORLD_SHA256);
    ModelManager::verify_file(&path, None)?;
    ModelManager::verify_file(&path, Some(HELLO_WORLD_SHA256))?;
    ModelManager::verify_file(&path, Some(&HELLO_WORLD_SHA256.to_uppercase()))?;

    match ModelManager::verify_file(&path, Some("deadbeef")) {
        Err(ModelError::HashMismatch { expected, actual, .. }) => {
            assert_eq!(expected, "deadbeef");
            assert_eq!(actual, HELLO_WORLD_SHA256);
        }
        other => panic!("expected hash mismatch, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_missing_file() {
    let result = ModelManager::verify_file(std::path::Path::new("/nonexistent/model.onnx"), None);
    assert!(matches!(result, Err(ModelError::NotFound(_))));
}
