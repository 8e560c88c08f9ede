//! Client-side configuration

use std::env;
use std::time::Duration;

use crate::error::{StudioError, StudioResult};
use crate::poller::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, PollConfig};

/// Proxy location used when `FRAMELAB_PROXY_URL` is not set
pub const DEFAULT_PROXY_URL: &str = "http://localhost:3001";

/// Configuration for talking to the FrameLab proxy
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Base URL of the proxy, without trailing slash
    pub proxy_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Completion polling behaviour
    pub poll: PollConfig,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            request_timeout: Duration::from_secs(300),
            poll: PollConfig::default(),
        }
    }
}

impl StudioConfig {
    /// Create a new StudioConfig from environment variables
    ///
    /// # Environment Variables
    /// - `FRAMELAB_PROXY_URL`: proxy base URL (default: [`DEFAULT_PROXY_URL`])
    /// - `FRAMELAB_REQUEST_TIMEOUT_SECS`: per-request timeout (default: 300)
    /// - `FRAMELAB_POLL_INTERVAL_SECS`: delay between status checks (default: 10)
    /// - `FRAMELAB_POLL_MAX_ATTEMPTS`: status checks before giving up (default: 90)
    pub fn from_env() -> StudioResult<Self> {
        let proxy_url = env::var("FRAMELAB_PROXY_URL")
            .unwrap_or_else(|_| DEFAULT_PROXY_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if !(proxy_url.starts_with("http://") || proxy_url.starts_with("https://")) {
            return Err(StudioError::validation(format!(
                "FRAMELAB_PROXY_URL must be an http(s) URL, got {}",
                proxy_url
            )));
        }

        let request_timeout = Duration::from_secs(parse_var("FRAMELAB_REQUEST_TIMEOUT_SECS", 300)?);
        let interval = parse_var("FRAMELAB_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL.as_secs())?;
        let max_attempts = parse_var("FRAMELAB_POLL_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS as u64)?;

        Ok(Self {
            proxy_url,
            request_timeout,
            poll: PollConfig {
                interval: Duration::from_secs(interval),
                max_attempts: Some(max_attempts.clamp(1, u32::MAX as u64) as u32),
                deadline: None,
            },
        })
    }
}

fn parse_var(name: &str, default: u64) -> StudioResult<u64> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| StudioError::validation(format!("{} must be a whole number", name))),
        Err(_) => Ok(default),
    }
}
