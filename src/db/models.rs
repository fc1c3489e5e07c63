use chrono::Utc;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::error::StorageError;

/// One saved classification. Rows are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub filename: String,
    pub emotion_label: String,
    pub confidence_percentage: f64,
    pub recorded_at: String,
}

/// Creates the predictions table if it does not exist. Existing rows are left alone.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), StorageError> {
    let schema = include_str!("schema.sql");
    let mut conn = pool.acquire().await?;
    sqlx::raw_sql(schema).execute(&mut *conn).await?;
    Ok(())
}

/// Appends a prediction. `confidence_percentage` must already be on the 0-100 scale.
pub async fn insert_prediction(
    pool: &SqlitePool,
    filename: &str,
    emotion_label: &str,
    confidence_percentage: f64,
) -> Result<i64, StorageError> {
    let mut conn = pool.acquire().await?;
    let result = sqlx::query(
        r#"
        INSERT INTO predictions (filename, emotion, confidence, recorded_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(filename)
    .bind(emotion_label)
    .bind(confidence_percentage)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// All predictions, oldest first.
pub async fn fetch_predictions(pool: &SqlitePool) -> Result<Vec<PredictionRecord>, StorageError> {
    let mut conn = pool.acquire().await?;
    let rows = sqlx::query(
        r#"
        SELECT id, filename, emotion, confidence, recorded_at
        FROM predictions
        ORDER BY id ASC
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        records.push(PredictionRecord {
            id: row.try_get("id")?,
            filename: row.try_get("filename")?,
            emotion_label: row.try_get("emotion")?,
            confidence_percentage: row.try_get("confidence")?,
            recorded_at: row.try_get("recorded_at")?,
        });
    }

    Ok(records)
}
