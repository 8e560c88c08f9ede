//! Video job models exchanged with the proxy

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a remote video job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether no further transition can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure details reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Snapshot of a video job as last reported by the engine
///
/// Snapshots are never updated in place; every status check yields a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoJob {
    pub id: String,
    pub status: JobStatus,
    /// Percentage complete, when the engine reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<String>,
    /// Unix timestamp (seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
}

impl VideoJob {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Requested clip length in whole seconds
    pub fn duration_seconds(&self) -> Option<i32> {
        self.seconds.as_deref().and_then(|s| s.trim().parse().ok())
    }

    /// Message explaining a failure, falling back to a generic one
    pub fn failure_message(&self) -> String {
        self.error
            .as_ref()
            .map(|e| e.message.trim())
            .filter(|m| !m.is_empty())
            .unwrap_or("Video generation failed")
            .to_string()
    }
}

/// A finished video persisted to durable storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResult {
    pub success: bool,
    /// Storage key of the uploaded file
    pub file_path: String,
    /// Durable playback URL
    pub public_url: String,
    pub video_id: String,
}
