//! Storyboard image generation and editing
//!
//! Generation sends the prompt to `POST /images/generations`; a change sends
//! the current image plus the instruction to `POST /images/edits`. Both
//! answer with base64 image data, which is returned as a PNG data URL.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use studio::data_url::{decode_data_url, encode_data_url};
use studio::wire::SceneImageRequest;
use tracing::{error, info};

use crate::config::{ApiKey, ImagesConfig};
use crate::engine::{relay_errors, upstream_unreachable};
use crate::error::{ApiError, ApiResult};

const ENGINE_NAME: &str = "OpenAI";
const OUTPUT_MIME: &str = "image/png";

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}

/// Image engine client holding the image credential
#[derive(Clone)]
pub struct ImageEngine {
    http: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
    model: String,
    size: String,
}

impl ImageEngine {
    /// Create a new image engine client
    pub fn new(http: reqwest::Client, config: &ImagesConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            size: config.size.clone(),
        }
    }

    /// Generate or edit a scene image, returning a data URL
    pub async fn render(&self, request: &SceneImageRequest) -> ApiResult<String> {
        if self.api_key.is_empty() {
            error!("Image engine API key is not configured");
            return Err(ApiError::NotConfigured("OPENAI_API_KEY"));
        }

        match request.change_instruction.as_deref().map(str::trim) {
            Some(instruction) if !instruction.is_empty() => {
                let existing = request.existing_image_base64.as_deref().ok_or_else(|| {
                    ApiError::bad_request("existingImageBase64 is required to change an image")
                })?;
                self.edit(&request.prompt, instruction, existing).await
            }
            _ => self.generate(&request.prompt).await,
        }
    }

    async fn generate(&self, prompt: &str) -> ApiResult<String> {
        if prompt.trim().is_empty() {
            return Err(ApiError::bad_request("Prompt is required"));
        }
        info!("Generating scene image: {}", prompt);

        let response = self
            .http
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(self.api_key.expose())
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "size": self.size,
                "n": 1,
            }))
            .send()
            .await
            .map_err(|e| upstream_unreachable(ENGINE_NAME, e))?;

        self.read_image(response).await
    }

    async fn edit(&self, prompt: &str, instruction: &str, existing: &str) -> ApiResult<String> {
        let image = decode_data_url(existing).map_err(|e| ApiError::bad_request(e.to_string()))?;
        info!("Editing scene image: {}", instruction);

        let extension = image
            .mime_type
            .strip_prefix("image/")
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("png");
        let part = Part::bytes(image.bytes)
            .file_name(format!("scene.{}", extension))
            .mime_str(&image.mime_type)
            .map_err(|e| ApiError::bad_request(format!("Invalid image type: {}", e)))?;

        let form = Form::new()
            .text("model", self.model.clone())
            .text("prompt", edit_prompt(prompt, instruction))
            .text("size", self.size.clone())
            .part("image", part);

        let response = self
            .http
            .post(format!("{}/images/edits", self.base_url))
            .bearer_auth(self.api_key.expose())
            .multipart(form)
            .send()
            .await
            .map_err(|e| upstream_unreachable(ENGINE_NAME, e))?;

        self.read_image(response).await
    }

    async fn read_image(&self, response: reqwest::Response) -> ApiResult<String> {
        let response = relay_errors(ENGINE_NAME, response).await?;
        let body: ImagesResponse = response
            .json()
            .await
            .map_err(|e| upstream_unreachable(ENGINE_NAME, e))?;

        let b64 = body
            .data
            .into_iter()
            .find_map(|d| d.b64_json)
            .ok_or_else(|| ApiError::Upstream {
                status: 502,
                message: format!("{} API error: no image returned", ENGINE_NAME),
            })?;

        // Round-trip through the decoder so a malformed payload never reaches the client
        let decoded = decode_data_url(&b64).map_err(|e| ApiError::Upstream {
            status: 502,
            message: format!("{} API error: {}", ENGINE_NAME, e),
        })?;
        Ok(encode_data_url(OUTPUT_MIME, &decoded.bytes))
    }
}

fn edit_prompt(prompt: &str, instruction: &str) -> String {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        instruction.to_string()
    } else {
        format!("{}\n\nChange: {}", prompt, instruction)
    }
}
