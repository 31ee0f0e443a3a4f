//! HTTP front-end: an upload page, a form handler that renders the result
//! page, and a JSON prediction endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use log::error;
use minijinja::{context, Environment, Value};
use serde::Serialize;
use serde_json::json;

use crate::classifier::ClassifierError;
use crate::service::{format_confidence, PredictionReport, PredictionService, ServiceError};

/// Default limit on request bodies
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

const INDEX_HTML: &str = include_str!("../../templates/index.html");
const RESULT_HTML: &str = include_str!("../../templates/result.html");

/// The HTML pages, parsed once. `.html` names turn on minijinja's HTML auto-escaping.
#[derive(Debug)]
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("index.html", INDEX_HTML)?;
        env.add_template("result.html", RESULT_HTML)?;
        Ok(Self { env })
    }

    fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }

    /// Upload page, optionally with a notice about a rejected file
    pub fn index_page(&self, notice: Option<&str>) -> Result<String, minijinja::Error> {
        self.render("index.html", context! { notice })
    }

    /// Result page for one prediction
    pub fn result_page(&self, report: &PredictionReport) -> Result<String, minijinja::Error> {
        let metadata: Vec<(&str, &str)> = report
            .metadata
            .iter()
            .map(|(field, value)| (field.display_name(), value))
            .collect();
        let others: Vec<(&str, String)> = report
            .other_predictions
            .iter()
            .map(|p| (p.label.as_str(), format_confidence(p.confidence)))
            .collect();

        self.render(
            "result.html",
            context! {
                anime_title => &report.anime_title,
                confidence => &report.confidence_display,
                // Base64 and a fixed MIME type, nothing to escape
                image_src => Value::from_safe_string(report.image_data_uri()),
                metadata,
                others,
            },
        )
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    service: Arc<PredictionService>,
    templates: Arc<Templates>,
}

/// Build the router.
///
/// # Errors
/// Fails if a page template does not parse.
pub fn build_router(
    service: Arc<PredictionService>,
    max_upload_bytes: usize,
) -> Result<Router, minijinja::Error> {
    let state = AppState {
        service,
        templates: Arc::new(Templates::new()?),
    };
    Ok(Router::new()
        .route("/", get(index_page).post(upload_form))
        .route("/api/predict", post(predict_json))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state))
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingFile => StatusCode::BAD_REQUEST,
            Self::UnsupportedExtension(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Classifier(ClassifierError::DecodeError(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Classifier(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

struct Upload {
    filename: String,
    data: Bytes,
}

/// Reads the `file` field; `None` when the form has no such field.
async fn read_upload(mut multipart: Multipart) -> Result<Option<Upload>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await?;
            return Ok(Some(Upload { filename, data }));
        }
    }
    Ok(None)
}

/// Runs decode and inference on the blocking pool.
async fn recognize(
    service: Arc<PredictionService>,
    upload: Upload,
) -> Result<PredictionReport, ServiceError> {
    tokio::task::spawn_blocking(move || service.recognize(&upload.filename, &upload.data))
        .await
        .map_err(|e| {
            let message = format!("Prediction task failed: {}", e);
            ServiceError::Classifier(ClassifierError::InferenceError(message))
        })?
}

fn html(page: Result<String, minijinja::Error>) -> Response {
    match page {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            error!("Failed to render page: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// --- Health endpoints ---

async fn health() -> &'static str {
    "OK"
}

async fn ready(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.service.is_available() {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Model not loaded")
    }
}

// --- HTML pages ---

async fn index_page(State(state): State<AppState>) -> Response {
    html(state.templates.index_page(None))
}

async fn upload_form(State(state): State<AppState>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(Some(upload)) if !upload.filename.is_empty() => upload,
        Ok(_) => return Redirect::to("/").into_response(),
        Err(e) => return e.into_response(),
    };

    match recognize(state.service.clone(), upload).await {
        Ok(report) => html(state.templates.result_page(&report)),
        Err(ServiceError::MissingFile) => Redirect::to("/").into_response(),
        Err(e @ ServiceError::UnsupportedExtension(_)) => {
            html(state.templates.index_page(Some(&e.to_string())))
        }
        Err(e) => {
            error!("{}", e);
            (e.status_code(), e.to_string()).into_response()
        }
    }
}

// --- JSON API ---

async fn predict_json(State(state): State<AppState>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return error_json(ServiceError::MissingFile),
        Err(e) => return e.into_response(),
    };

    match recognize(state.service, upload).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_json(e),
    }
}

fn error_json(e: ServiceError) -> Response {
    if !matches!(e, ServiceError::MissingFile | ServiceError::UnsupportedExtension(_)) {
        error!("{}", e);
    }
    (e.status_code(), Json(json!({ "error": e.to_string() }))).into_response()
}
