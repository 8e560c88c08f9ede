//! Error types for the studio core

use thiserror::Error;

/// Errors raised by the studio core
#[derive(Error, Debug)]
pub enum StudioError {
    /// Input rejected locally, before any remote call
    #[error("{0}")]
    Validation(String),

    /// The image could not be decoded or re-encoded
    #[error("image processing failed")]
    ImageProcessing(#[source] image::ImageError),

    /// The proxy answered with a non-success status
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The engine reported the job as failed
    #[error("Video generation failed: {message}")]
    JobFailed { job_id: String, message: String },

    /// The poller gave up before the job reached a terminal state
    #[error("Video {job_id} did not finish after {attempts} status checks")]
    PollExhausted { job_id: String, attempts: u32 },

    /// The caller cancelled the operation
    #[error("Cancelled")]
    Cancelled,
}

impl StudioError {
    /// Whether the error was raised before contacting the proxy
    pub fn is_validation(&self) -> bool {
        matches!(self, StudioError::Validation(_))
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        StudioError::Validation(message.into())
    }
}

/// Type alias for studio results
pub type StudioResult<T> = Result<T, StudioError>;
