//! Proxy configuration
//!
//! Defaults live in code and are overridden by environment variables prefixed
//! with `FRAMELAB_`, nested with `__`: `FRAMELAB_ENGINE__API_KEY` sets
//! `engine.api_key`.

use std::fmt;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Credential that never shows up in logs
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("ApiKey(<unset>)")
        } else {
            f.write_str("ApiKey(<redacted>)")
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Largest accepted request body, in bytes
    pub body_limit_bytes: usize,
}

/// Video engine (OpenAI videos API)
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub base_url: String,
    pub api_key: ApiKey,
    pub model: String,
    pub seconds: String,
    pub size: String,
}

/// Image engine used by the storyboard editor
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesConfig {
    pub base_url: String,
    /// Falls back to the video engine key when unset
    pub api_key: ApiKey,
    pub model: String,
    pub size: String,
}

/// ElevenLabs speech synthesis
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    pub base_url: String,
    pub api_key: ApiKey,
    pub default_voice: String,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: String,
    /// Custom S3 endpoint (MinIO, R2, ...)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Prefix of the durable URLs handed to clients
    pub public_base_url: String,
}

impl StorageConfig {
    /// Public URL of an object key
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    pub enabled: bool,
}

/// Full proxy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub images: ImagesConfig,
    pub speech: SpeechConfig,
    pub storage: StorageConfig,
    pub history: HistoryConfig,
}

impl ProxyConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_environment(Self::environment())
    }

    /// Load configuration from an explicit environment source
    pub fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let mut config: ProxyConfig = Config::builder()
            .set_default("server.bind_addr", "0.0.0.0:3001")?
            .set_default("server.body_limit_bytes", 20_i64 * 1024 * 1024)?
            .set_default("engine.base_url", "https://api.openai.com/v1")?
            .set_default("engine.api_key", "")?
            .set_default("engine.model", "sora-2")?
            .set_default("engine.seconds", "12")?
            .set_default("engine.size", "1280x720")?
            .set_default("images.base_url", "https://api.openai.com/v1")?
            .set_default("images.api_key", "")?
            .set_default("images.model", "gpt-image-1")?
            .set_default("images.size", "1536x1024")?
            .set_default("speech.base_url", "https://api.elevenlabs.io")?
            .set_default("speech.api_key", "")?
            .set_default("speech.default_voice", "NBqeXKdZHweef6y0B67V")?
            .set_default("speech.model", "eleven_multilingual_v2")?
            .set_default("storage.backend", "s3")?
            .set_default("storage.bucket", "videos")?
            .set_default("storage.public_base_url", "http://localhost:9000/videos")?
            .set_default("history.enabled", false)?
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        if config.images.api_key.is_empty() {
            config.images.api_key = config.engine.api_key.clone();
        }
        if config.server.body_limit_bytes == 0 {
            return Err(ConfigError::Message(
                "server.body_limit_bytes must be greater than 0".to_string(),
            ));
        }

        Ok(config)
    }

    fn environment() -> Environment {
        Environment::with_prefix("FRAMELAB")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Environment source backed by a fixed map, for tests
    pub fn environment_from<I, K, V>(vars: I) -> Environment
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::environment().source(Some(
            vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ))
    }
}
