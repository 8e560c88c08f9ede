//! ElevenLabs speech synthesis

use bytes::Bytes;
use serde_json::json;
use tracing::{error, info};

use crate::config::{ApiKey, SpeechConfig};
use crate::engine::{relay_errors, upstream_unreachable};
use crate::error::{ApiError, ApiResult};

const ENGINE_NAME: &str = "ElevenLabs";

/// Speech engine client holding the ElevenLabs credential
#[derive(Clone)]
pub struct SpeechEngine {
    http: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
    default_voice: String,
    model: String,
}

impl SpeechEngine {
    /// Create a new speech client
    pub fn new(http: reqwest::Client, config: &SpeechConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            default_voice: config.default_voice.clone(),
            model: config.model.clone(),
        }
    }

    /// Synthesise `text` as MPEG audio with `voice_id` or the default voice
    pub async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> ApiResult<Bytes> {
        if text.trim().is_empty() {
            return Err(ApiError::bad_request("Text is required"));
        }
        if self.api_key.is_empty() {
            error!("Speech API key is not configured");
            return Err(ApiError::NotConfigured("ELEVENLABS_API_KEY"));
        }

        let voice_id = voice_id
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.default_voice);
        if !voice_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ApiError::bad_request("Invalid voice_id"));
        }

        info!("Converting text to speech with voice {}: {}", voice_id, text);

        let response = self
            .http
            .post(format!("{}/v1/text-to-speech/{}", self.base_url, voice_id))
            .header("xi-api-key", self.api_key.expose())
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&json!({
                "text": text,
                "model_id": self.model,
            }))
            .send()
            .await
            .map_err(|e| upstream_unreachable(ENGINE_NAME, e))?;

        let response = relay_errors(ENGINE_NAME, response).await?;
        let audio = response
            .bytes()
            .await
            .map_err(|e| upstream_unreachable(ENGINE_NAME, e))?;

        info!("Synthesised {} bytes of audio", audio.len());
        Ok(audio)
    }
}
