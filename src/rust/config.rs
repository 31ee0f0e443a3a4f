use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::model_manager::{ModelManager, ROOT_ENV_VAR};
use crate::models::BuiltinModel;
use crate::runtime::{DevicePreference, RuntimeConfig};
use crate::server::DEFAULT_MAX_UPLOAD_BYTES;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Identify the anime a screenshot comes from", long_about = None)]
pub struct Config {
    /// Install root that relative model and dataset paths are resolved against
    #[arg(long, env = ROOT_ENV_VAR)]
    pub root: Option<PathBuf>,

    /// ONNX model file
    #[arg(
        long,
        env = "ANIME_LENS_MODEL",
        default_value = BuiltinModel::AnimeResNet50.get_paths().0
    )]
    pub model: PathBuf,

    /// CSV dataset with per-title metadata
    #[arg(
        long,
        env = "ANIME_LENS_DATASET",
        default_value = BuiltinModel::AnimeResNet50.get_paths().1
    )]
    pub dataset: PathBuf,

    /// Expected SHA-256 of the model file; skipped when unset
    #[arg(long, env = "ANIME_LENS_MODEL_SHA256")]
    pub model_sha256: Option<String>,

    /// Address to listen on
    #[arg(long, env = "ANIME_LENS_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Largest accepted request body in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Threads used within a single operator (0 lets ONNX Runtime decide)
    #[arg(long, default_value_t = 0)]
    pub intra_threads: usize,

    /// Threads used across independent operators (0 lets ONNX Runtime decide)
    #[arg(long, default_value_t = 0)]
    pub inter_threads: usize,

    /// Run inference on the CPU even when an accelerator is available
    #[arg(long)]
    pub cpu: bool,
}

impl Config {
    pub fn model_manager(&self) -> ModelManager {
        match &self.root {
            Some(root) => ModelManager::new(root),
            None => ModelManager::new_default(),
        }
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_manager().resolve(&self.model)
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.model_manager().resolve(&self.dataset)
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            inter_threads: self.inter_threads,
            intra_threads: self.intra_threads,
            device: if self.cpu { DevicePreference::Cpu } else { DevicePreference::Auto },
            ..RuntimeConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_resolve_under_root() {
        let config = Config::try_parse_from(["anime_lens", "--root", "/opt/lens"]).unwrap();
        assert_eq!(
            config.model_path(),
            PathBuf::from("/opt/lens/models/trained_resnet50_final.onnx")
        );
        assert_eq!(config.dataset_path(), PathBuf::from("/opt/lens/data/anime.csv"));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(config.model_sha256.is_none());
    }

    #[test]
    fn test_absolute_paths_and_runtime_flags() {
        let config = Config::try_parse_from([
            "anime_lens",
            "--root",
            "/opt/lens",
            "--dataset",
            "/data/anime.csv",
            "--bind",
            "0.0.0.0:8080",
            "--intra-threads",
            "4",
            "--cpu",
        ])
        .unwrap();
        assert_eq!(config.dataset_path(), PathBuf::from("/data/anime.csv"));
        assert_eq!(config.bind.port(), 8080);
        let runtime = config.runtime_config();
        assert_eq!(runtime.intra_threads, 4);
        assert_eq!(runtime.device, DevicePreference::Cpu);
    }
}
