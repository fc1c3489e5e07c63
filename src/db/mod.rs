pub mod models;

pub use models::{PredictionRecord, ensure_schema, fetch_predictions, insert_prediction};

/// Single-connection in-memory database with the schema applied.
#[cfg(test)]
pub async fn memory_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    ensure_schema(&pool).await.expect("schema");
    pool
}
