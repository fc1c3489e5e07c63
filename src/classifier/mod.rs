//! Emotion classification is delegated to an external model.
//!
//! The rest of the crate only sees [`EmotionClassifier`]; the production
//! implementation talks to a model service over HTTP.

pub mod client;

use async_trait::async_trait;
use crate::error::ClassificationError;

pub use client::HttpClassifier;

/// Raw classifier output. `confidence` may be a 0-1 fraction or a 0-100 percentage.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionPrediction {
    pub label: String,
    pub confidence: f64,
}

#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    async fn classify(&self, image: &[u8]) -> Result<EmotionPrediction, ClassificationError>;
}
