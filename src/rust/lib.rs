//! Identify the anime a screenshot comes from.
//!
//! A ResNet-50 image classifier, exported to ONNX and run through ONNX Runtime,
//! ranks 30 anime titles for an uploaded image. The top title is joined with
//! metadata from a CSV dataset and served over HTTP.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use anime_lens::{Classifier, MetadataIndex};
//!
//! let classifier = Classifier::builder()
//!     .with_model_path("models/trained_resnet50_final.onnx")
//!     .build()?;
//! let index = MetadataIndex::build("data/anime.csv", classifier.labels());
//!
//! let bytes = std::fs::read("screenshot.jpg")?;
//! let top = classifier.predict_top(&bytes)?;
//! println!("{} ({:.2}%)", top.label, top.confidence * 100.0);
//! for (field, value) in index.lookup(&top.label).iter() {
//!     println!("  {}: {}", field, value);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! [`Classifier`] and [`MetadataIndex`] are immutable after construction and can
//! be shared across threads with `Arc`; the HTTP server does exactly that.

pub mod classifier;
pub mod config;
pub mod metadata;
pub mod model_manager;
pub mod models;
mod runtime;
pub mod server;
pub mod service;

pub use classifier::{
    Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo, InferenceBackend, OnnxBackend,
    Prediction,
};
pub use config::Config;
pub use metadata::{MetadataField, MetadataIndex, MetadataRecord};
pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ANIME_TITLES};
pub use runtime::{create_session_builder, Device, DevicePreference, RuntimeConfig};
pub use server::{build_router, Templates};
pub use service::{PredictionReport, PredictionService, ServiceError};

pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
