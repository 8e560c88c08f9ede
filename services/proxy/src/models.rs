//! History models for the proxy service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default page size of the history listing
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;
/// Largest page size of the history listing
pub const MAX_HISTORY_LIMIT: u32 = 100;

/// A stored video, as recorded in `video_generations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    pub id: Uuid,
    pub video_url: String,
    pub prompt: Option<String>,
    pub image_url: Option<String>,
    /// Seconds
    pub duration: Option<i32>,
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row to insert after a successful upload
#[derive(Debug, Clone)]
pub struct NewGeneration {
    pub video_url: String,
    pub prompt: Option<String>,
    pub duration: Option<i32>,
    pub model: Option<String>,
}

/// Query parameters for the history listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    /// Number of records to return
    pub limit: Option<u32>,
}

impl HistoryQuery {
    /// Requested page size, clamped to `1..=MAX_HISTORY_LIMIT`
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT)
    }
}

/// Response of the history listing
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub items: Vec<GenerationRecord>,
    pub limit: u32,
}
