mod classifier;
mod config;
mod db;
mod error;
mod flow;

use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emotion_detector=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!(
        "Starting emotion detector on port {} with classifier at {}",
        config.port,
        config.classifier_url
    );

    // Make sure the database directory exists before SQLite creates the file
    if let Some(parent) = std::path::Path::new(config.database_path()).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&format!("{}?mode=rwc", config.database_url))
        .await?;

    db::ensure_schema(&db).await?;
    tracing::info!("Database initialized at {}", config.database_url);

    let classifier = classifier::HttpClassifier::new(&config.classifier_url)?;
    let templates = flow::view::templates()?;

    let state = Arc::new(flow::AppState {
        config: config.clone(),
        db,
        classifier: Arc::new(classifier),
        templates,
    });

    let app = flow::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!("Emotion detector listening on 0.0.0.0:{}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
