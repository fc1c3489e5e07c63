use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::Html,
};
use minijinja::Environment;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;

use super::view::{self, History, Outcome};
use super::{Upload, classify, persist};
use crate::classifier::EmotionClassifier;
use crate::config::Config;
use crate::error::{AppError, ClassificationError};

/// Multipart field that carries the image.
const IMAGE_FIELD: &str = "image";

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: SqlitePool,
    pub classifier: Arc<dyn EmotionClassifier>,
    pub templates: Environment<'static>,
}

pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    render(&state, Outcome::Idle).await
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let outcome = match read_upload(multipart).await {
        Ok(upload) => run_interaction(&state, upload).await,
        Err(AppError::Classification(e)) => {
            tracing::warn!("Upload rejected: {}", e);
            Outcome::Failed(e.to_string())
        }
        Err(AppError::BadRequest(message)) => {
            tracing::warn!("Unreadable upload: {}", message);
            Outcome::Failed(message)
        }
        Err(e) => return Err(e),
    };

    render(&state, outcome).await
}

pub async fn list_predictions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let predictions = crate::db::fetch_predictions(&state.db).await?;
    Ok(Json(json!({ "predictions": predictions })))
}

pub async fn create_prediction(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let upload = read_upload(multipart).await?;
    let classified = classify(state.classifier.as_ref(), &upload).await?;
    let id = persist(&state.db, &classified).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": id,
            "filename": classified.filename,
            "emotion_label": classified.emotion_label,
            "confidence_percentage": classified.confidence_percentage,
            "confidence_display": classified.confidence_display(),
        })),
    ))
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "emotion_detector"
    }))
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        return Ok(Upload::accept(filename.as_deref(), bytes)?);
    }

    Err(ClassificationError::NoImage.into())
}

/// Classifies and saves one upload. A failed classification is never saved.
async fn run_interaction(state: &AppState, upload: Upload) -> Outcome {
    let classified = match classify(state.classifier.as_ref(), &upload).await {
        Ok(classified) => classified,
        Err(e) => {
            tracing::warn!(filename = %upload.filename, "Classification failed: {}", e);
            return Outcome::Failed(e.to_string());
        }
    };

    let saved = match persist(&state.db, &classified).await {
        Ok(_) => true,
        Err(e) => {
            tracing::error!(filename = %classified.filename, "Failed to save prediction: {}", e);
            false
        }
    };

    Outcome::Classified {
        preview: upload.data_uri(),
        classified,
        saved,
    }
}

async fn render(state: &AppState, outcome: Outcome) -> Result<Html<String>, AppError> {
    let history = match crate::db::fetch_predictions(&state.db).await {
        Ok(records) => History::Records(records),
        Err(e) => {
            tracing::error!("Failed to load prediction history: {}", e);
            History::Unavailable
        }
    };

    let page = view::render_page(&state.templates, &outcome, &history)?;
    Ok(Html(page))
}
