use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// The classifier could not turn an upload into a prediction.
#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("No image was uploaded")]
    NoImage,

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Classifier rejected the image: {0}")]
    Rejected(String),

    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid response from classifier: {0}")]
    InvalidResponse(String),

    #[error("Classifier returned an out-of-range confidence: {0}")]
    InvalidConfidence(f64),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Template error: {0}")]
    Render(#[from] minijinja::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, error_message) = match &self {
            AppError::Classification(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "classification_error",
                self.to_string(),
            ),
            AppError::Storage(_) => {
                tracing::error!("Storage error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "Internal server error".to_string(),
                )
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", self.to_string()),
            AppError::Render(_) => {
                tracing::error!("Render error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "render_error",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type,
            }
        }));

        (status, body).into_response()
    }
}
