use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::BuiltinModel;

/// Environment variable overriding the install root
pub const ROOT_ENV_VAR: &str = "ANIME_LENS_ROOT";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model file not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file}")]
    HashMismatch {
        file: String,
        expected: String,
        actual: String,
    },
}

/// Resolves model and dataset files under an install root and verifies them.
#[derive(Debug, Clone)]
pub struct ModelManager {
    root: PathBuf,
}

impl ModelManager {
    /// Creates a new ModelManager rooted at the default install root
    pub fn new_default() -> Self {
        Self::new(Self::get_default_root())
    }

    /// Returns the default install root
    pub fn get_default_root() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(ROOT_ENV_VAR) {
            return PathBuf::from(path);
        }

        // 2. Fall back to the working directory the server was started from
        env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins relative paths onto the install root; absolute paths are returned unchanged.
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn get_model_path(&self, model: BuiltinModel) -> PathBuf {
        self.resolve(model.get_paths().0)
    }

    pub fn get_dataset_path(&self, model: BuiltinModel) -> PathBuf {
        self.resolve(model.get_paths().1)
    }

    pub fn is_model_present(&self, model: BuiltinModel) -> bool {
        let model_path = self.get_model_path(model);
        log::info!("Model path: {:?} (exists: {})", model_path, model_path.exists());
        model_path.exists()
    }

    /// Computes the lowercase hex SHA-256 digest of a file
    pub fn sha256_file(path: &Path) -> Result<String, ModelError> {
        let bytes = fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Checks that `path` exists and, when `expected_hash` is given, that its digest matches.
    pub fn verify_file(path: &Path, expected_hash: Option<&str>) -> Result<(), ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.display().to_string()));
        }
        let Some(expected) = expected_hash else {
            return Ok(());
        };

        log::info!("Verifying file: {:?}", path);
        let actual = Self::sha256_file(path)?;
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            log::error!("Hash mismatch for {:?}: expected {}, got {}", path, expected, actual);
            return Err(ModelError::HashMismatch {
                file: path.display().to_string(),
                expected: expected.to_string(),
                actual,
            });
        }
        log::info!("File verified successfully");
        Ok(())
    }
}
