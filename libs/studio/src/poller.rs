//! Completion polling for video jobs
//!
//! The poller checks a job's status, sleeps for a fixed interval and checks
//! again until the job reaches a terminal state. Checks are strictly
//! sequential: the next one is scheduled only after the previous response
//! arrived. The loop is bounded by an attempt count and an optional deadline
//! and stops as soon as the caller's [`CancellationToken`] fires.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{StudioError, StudioResult};
use crate::job::{JobStatus, VideoJob};

/// Delay between two status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Status checks before giving up (15 minutes at the default interval)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 90;

/// Anything that can report the current snapshot of a job
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn check_video_status(&self, job_id: &str) -> StudioResult<VideoJob>;
}

/// Poll loop bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between two status checks
    pub interval: Duration,
    /// Maximum number of status checks, `None` for no limit
    pub max_attempts: Option<u32>,
    /// Wall-clock budget for the whole loop, `None` for no limit
    pub deadline: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            deadline: None,
        }
    }
}

/// Drives a job to a terminal state
#[derive(Debug, Clone, Default)]
pub struct CompletionPoller {
    config: PollConfig,
}

impl CompletionPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll `job_id` until it completes
    ///
    /// `on_progress` is called once per non-terminal snapshot. Returns the
    /// completed snapshot, or an error when the job fails, the bounds are
    /// exhausted, a status check fails, or `cancel` fires.
    pub async fn wait_for_completion<S, F>(
        &self,
        source: &S,
        job_id: &str,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> StudioResult<VideoJob>
    where
        S: JobStatusSource + ?Sized,
        F: FnMut(&VideoJob) + Send,
    {
        let started = Instant::now();
        let deadline_at = self.config.deadline.map(|deadline| started + deadline);
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            let job = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Polling of {} cancelled after {} checks", job_id, attempts);
                    return Err(StudioError::Cancelled);
                }
                result = source.check_video_status(job_id) => result?,
                _ = sleep_until_deadline(deadline_at) => {
                    warn!("Deadline passed while checking video {}", job_id);
                    return Err(StudioError::PollExhausted {
                        job_id: job_id.to_string(),
                        attempts,
                    });
                }
            };

            debug!(
                "Video {} status: {} (progress {:?}, check {})",
                job_id, job.status, job.progress, attempts
            );

            match job.status {
                JobStatus::Completed => {
                    info!("Video {} completed after {} checks", job_id, attempts);
                    return Ok(job);
                }
                JobStatus::Failed => {
                    let message = job.failure_message();
                    warn!("Video {} failed: {}", job_id, message);
                    return Err(StudioError::JobFailed {
                        job_id: job_id.to_string(),
                        message,
                    });
                }
                JobStatus::Queued | JobStatus::InProgress => on_progress(&job),
            }

            if self.is_exhausted(attempts, started) {
                warn!("Giving up on video {} after {} checks", job_id, attempts);
                return Err(StudioError::PollExhausted {
                    job_id: job_id.to_string(),
                    attempts,
                });
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Polling of {} cancelled after {} checks", job_id, attempts);
                    return Err(StudioError::Cancelled);
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }

    fn is_exhausted(&self, attempts: u32, started: Instant) -> bool {
        let attempts_spent = self
            .config
            .max_attempts
            .is_some_and(|max| attempts >= max);
        let time_spent = self
            .config
            .deadline
            .is_some_and(|deadline| started.elapsed() + self.config.interval > deadline);

        attempts_spent || time_spent
    }
}

/// Resolves at `at`, never when there is no deadline
async fn sleep_until_deadline(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
