use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use anime_lens::{
    build_router, Classifier, ClassifierError, Config, MetadataIndex, PredictionService,
};
use clap::Parser;
use log::{error, info, warn};

fn load_classifier(config: &Config) -> Result<Classifier, ClassifierError> {
    let mut builder = Classifier::builder()
        .with_runtime_config(config.runtime_config())
        .with_model_path(config.model_path());
    if let Some(sha256) = &config.model_sha256 {
        builder = builder.with_checksum(sha256.clone());
    }
    builder.build()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    anime_lens::init_logger();
    let config = Config::parse();

    info!("=== Starting Anime Lens ===");
    info!("Install root: {:?}", config.model_manager().root());

    let start_time = Instant::now();
    let classifier = match load_classifier(&config) {
        Ok(classifier) => {
            let info = classifier.info();
            info!(
                "Model loaded successfully from {:?} ({} classes on {}, took {:.2?})",
                config.model_path(),
                info.num_classes,
                info.device,
                start_time.elapsed()
            );
            Some(Arc::new(classifier))
        }
        Err(e) => {
            error!("Error loading model: {}", e);
            warn!("Serving in degraded mode: every prediction request will be rejected");
            None
        }
    };

    let labels: Vec<String> = match &classifier {
        Some(classifier) => classifier.labels().to_vec(),
        None => anime_lens::ANIME_TITLES.iter().map(|label| label.to_string()).collect(),
    };
    let index = MetadataIndex::build(config.dataset_path(), &labels);
    let covered: HashSet<&str> = index.labels().collect();
    let missing: Vec<&str> = labels
        .iter()
        .map(String::as_str)
        .filter(|label| !covered.contains(label))
        .collect();
    if !missing.is_empty() {
        warn!(
            "{} of {} titles will be shown without metadata: {}",
            missing.len(),
            labels.len(),
            missing.join(", ")
        );
    }

    let service = Arc::new(PredictionService::new(classifier, Arc::new(index)));
    let router = build_router(service, config.max_upload_bytes)?;

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("Listening on http://{}", config.bind);
    axum::serve(listener, router).await?;

    Ok(())
}
