//! Application state shared across handlers

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ProxyConfig, StorageConfig};
use crate::engine::VideoEngine;
use crate::image_edit::ImageEngine;
use crate::repositories::HistoryRepository;
use crate::speech::SpeechEngine;
use crate::storage::ObjectStorage;

/// Upper bound for a single upstream call; video downloads can be large
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(300);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: VideoEngine,
    pub images: ImageEngine,
    pub speech: SpeechEngine,
    pub storage: Arc<dyn ObjectStorage>,
    pub storage_config: StorageConfig,
    /// `None` when history is disabled
    pub history: Option<HistoryRepository>,
    pub body_limit: usize,
}

impl AppState {
    /// Create the state with one HTTP client shared by every engine
    pub fn new(
        config: &ProxyConfig,
        storage: Arc<dyn ObjectStorage>,
        history: Option<HistoryRepository>,
    ) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()?;

        Ok(Self {
            engine: VideoEngine::new(http.clone(), &config.engine),
            images: ImageEngine::new(http.clone(), &config.images),
            speech: SpeechEngine::new(http, &config.speech),
            storage,
            storage_config: config.storage.clone(),
            history,
            body_limit: config.server.body_limit_bytes,
        })
    }
}
