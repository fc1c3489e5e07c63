//! Upload → classify → display → persist.
//!
//! An interaction moves through three states: idle (no upload), uploaded
//! ([`Upload`], validated but not yet classified) and classified
//! ([`Classified`], shown and saved). Failures at any step put the page back
//! to idle with a notice and never reach the store.

pub mod handlers;
pub mod view;

use std::path::Path;
use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, routing::get};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use image::ImageFormat;
use serde::Serialize;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use crate::classifier::EmotionClassifier;
use crate::error::{ClassificationError, StorageError};

pub use handlers::AppState;

/// Stored in place of the filename when the upload carries none.
pub const PLACEHOLDER_FILENAME: &str = "unknown_file";

pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// An image that passed upload validation.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Bytes,
    pub format: ImageFormat,
}

impl Upload {
    pub fn accept(filename: Option<&str>, bytes: Bytes) -> Result<Self, ClassificationError> {
        if bytes.is_empty() {
            return Err(ClassificationError::NoImage);
        }

        let filename = filename
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(PLACEHOLDER_FILENAME)
            .to_string();

        if filename != PLACEHOLDER_FILENAME {
            let extension = Path::new(&filename)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.to_ascii_lowercase());

            let accepted = extension
                .as_deref()
                .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext));
            if !accepted {
                return Err(ClassificationError::UnsupportedFormat(format!(
                    "{} (expected jpg, jpeg or png)",
                    filename
                )));
            }
        }

        let format = match image::guess_format(&bytes) {
            Ok(format @ (ImageFormat::Jpeg | ImageFormat::Png)) => format,
            Ok(other) => {
                return Err(ClassificationError::UnsupportedFormat(format!(
                    "{:?} data",
                    other
                )));
            }
            Err(_) => {
                return Err(ClassificationError::UnsupportedFormat(
                    "unrecognized image data".to_string(),
                ));
            }
        };

        Ok(Self {
            filename,
            bytes,
            format,
        })
    }

    /// The image inlined as a `data:` URI for the preview.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.to_mime_type(),
            STANDARD.encode(&self.bytes)
        )
    }
}

/// A classification result with confidence on the 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classified {
    pub filename: String,
    pub emotion_label: String,
    pub confidence_percentage: f64,
}

impl Classified {
    pub fn confidence_display(&self) -> String {
        format!("{:.2}%", self.confidence_percentage)
    }

    /// Whole percent for the progress bar.
    pub fn progress(&self) -> u8 {
        self.confidence_percentage.clamp(0.0, 100.0) as u8
    }
}

/// Scales a 0-1 fraction to a percentage; anything above 1 is taken as a percentage already.
///
/// A genuine 1% result is indistinguishable from a 0.01 fraction and comes out as 100%.
pub fn normalize_confidence(confidence: f64) -> f64 {
    if confidence <= 1.0 {
        confidence * 100.0
    } else {
        confidence
    }
}

pub async fn classify(
    classifier: &dyn EmotionClassifier,
    upload: &Upload,
) -> Result<Classified, ClassificationError> {
    let prediction = classifier.classify(&upload.bytes).await?;

    if !prediction.confidence.is_finite() || prediction.confidence.is_sign_negative() {
        return Err(ClassificationError::InvalidConfidence(prediction.confidence));
    }

    let confidence_percentage = normalize_confidence(prediction.confidence);
    if confidence_percentage > 100.0 {
        return Err(ClassificationError::InvalidConfidence(prediction.confidence));
    }

    tracing::info!(
        filename = %upload.filename,
        emotion = %prediction.label,
        confidence = confidence_percentage,
        "classified upload"
    );

    Ok(Classified {
        filename: upload.filename.clone(),
        emotion_label: prediction.label,
        confidence_percentage,
    })
}

pub async fn persist(pool: &SqlitePool, classified: &Classified) -> Result<i64, StorageError> {
    crate::db::insert_prediction(
        pool,
        &classified.filename,
        &classified.emotion_label,
        classified.confidence_percentage,
    )
    .await
}

pub fn router(state: Arc<AppState>) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::index).post(handlers::submit))
        .route(
            "/api/predictions",
            get(handlers::list_predictions).post(handlers::create_prediction),
        )
        .route("/health", get(handlers::health_check))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
