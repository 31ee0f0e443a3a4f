use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::Result as OrtResult;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Where inference should run when the session is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePreference {
    /// Use a hardware accelerator if one is compiled in and available, else the CPU
    #[default]
    Auto,
    /// Always run on the CPU
    Cpu,
}

/// The compute device a session ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Cuda,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda => write!(f, "cuda"),
        }
    }
}

#[derive(Debug)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: GraphOptimizationLevel,
    pub device: DevicePreference,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0, // Let ONNX Runtime decide
            intra_threads: 0, // Let ONNX Runtime decide
            optimization_level: GraphOptimizationLevel::Level3,
            device: DevicePreference::Auto,
        }
    }
}

impl Clone for RuntimeConfig {
    fn clone(&self) -> Self {
        Self {
            inter_threads: self.inter_threads,
            intra_threads: self.intra_threads,
            optimization_level: copy_level(&self.optimization_level),
            device: self.device,
        }
    }
}

fn copy_level(level: &GraphOptimizationLevel) -> GraphOptimizationLevel {
    match level {
        GraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
        GraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
        GraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        GraphOptimizationLevel::Disable => GraphOptimizationLevel::Disable,
    }
}

fn init_onnx_environment() -> OrtResult<()> {
    ort::init()
        .with_name("anime-lens")
        .commit()?;
    Ok(())
}

/// Initializes the process-wide ONNX Runtime environment once.
///
/// A failed initialization is remembered and reported to every later caller.
pub fn ensure_initialized() -> Result<(), String> {
    init_once(&INIT, || init_onnx_environment().map_err(|e| e.to_string()))
}

fn init_once<F>(cell: &OnceLock<Result<(), String>>, init: F) -> Result<(), String>
where
    F: FnOnce() -> Result<(), String>,
{
    cell.get_or_init(init).clone()
}

/// Creates a session builder configured from `config` and reports the device it targets.
pub fn create_session_builder(config: &RuntimeConfig) -> OrtResult<(SessionBuilder, Device)> {
    let mut builder = Session::builder()?;

    // Configure threading
    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }

    builder = builder.with_optimization_level(copy_level(&config.optimization_level))?;

    #[cfg(feature = "cuda")]
    {
        use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};

        if config.device == DevicePreference::Auto {
            let cuda = CUDAExecutionProvider::default();
            if cuda.is_available().unwrap_or(false) {
                log::info!("CUDA execution provider available");
                builder = builder.with_execution_providers([cuda.build()])?;
                return Ok((builder, Device::Cuda));
            }
            log::warn!("CUDA feature enabled but runtime not available, using CPU");
        }
    }

    Ok((builder, Device::Cpu))
}
