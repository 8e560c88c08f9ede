//! History repository for database operations

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{GenerationRecord, NewGeneration};

const SCHEMA: &str = include_str!("../sql/video_generations.sql");

/// Repository over the `video_generations` table
#[derive(Clone)]
pub struct HistoryRepository {
    pool: PgPool,
}

impl HistoryRepository {
    /// Create a new history repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the history table when it does not exist yet
    pub async fn ensure_schema(&self) -> DatabaseResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Record a stored video
    pub async fn insert(&self, generation: &NewGeneration) -> DatabaseResult<GenerationRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO video_generations (id, video_url, prompt, duration, model)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, video_url, prompt, image_url, duration, model, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&generation.video_url)
        .bind(&generation.prompt)
        .bind(generation.duration)
        .bind(&generation.model)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(record_from_row(&row))
    }

    /// Most recent records first
    pub async fn list_recent(&self, limit: u32) -> DatabaseResult<Vec<GenerationRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, video_url, prompt, image_url, duration, model, created_at
            FROM video_generations
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(rows.iter().map(record_from_row).collect())
    }
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> GenerationRecord {
    GenerationRecord {
        id: row.get("id"),
        video_url: row.get("video_url"),
        prompt: row.get("prompt"),
        image_url: row.get("image_url"),
        duration: row.get("duration"),
        model: row.get("model"),
        created_at: row.get("created_at"),
    }
}
