//! Client for the video generation engine
//!
//! Jobs are created with a multipart request and then addressed by id:
//! `GET /videos/{id}` for the status and `GET /videos/{id}/content` for the
//! finished MP4.

use std::sync::LazyLock;

use bytes::Bytes;
use regex::Regex;
use reqwest::{
    Response,
    multipart::{Form, Part},
};
use studio::VideoJob;
use tracing::{error, info};

use crate::config::{ApiKey, EngineConfig};
use crate::error::{ApiError, ApiResult};

/// Name used in relayed error messages
pub const ENGINE_NAME: &str = "OpenAI";

static JOB_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("job id pattern compiles"));

/// Reject ids that could escape the `/videos/{id}` path
pub fn validate_job_id(id: &str) -> ApiResult<&str> {
    if JOB_ID.is_match(id) {
        Ok(id)
    } else {
        Err(ApiError::bad_request("Invalid videoId"))
    }
}

/// Reference image forwarded with a new job
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    pub bytes: Bytes,
    pub file_name: String,
    pub content_type: String,
}

/// Video engine client holding the engine credential
#[derive(Clone)]
pub struct VideoEngine {
    http: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
    model: String,
    seconds: String,
    size: String,
}

impl VideoEngine {
    /// Create a new engine client
    pub fn new(http: reqwest::Client, config: &EngineConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            seconds: config.seconds.clone(),
            size: config.size.clone(),
        }
    }

    fn key(&self) -> ApiResult<&str> {
        if self.api_key.is_empty() {
            error!("Video engine API key is not configured");
            return Err(ApiError::NotConfigured("OPENAI_API_KEY"));
        }
        Ok(self.api_key.expose())
    }

    /// Submit a new generation job
    pub async fn create_video(
        &self,
        prompt: &str,
        reference: Option<ReferenceImage>,
    ) -> ApiResult<VideoJob> {
        let key = self.key()?;

        let mut form = Form::new()
            .text("model", self.model.clone())
            .text("prompt", prompt.to_string())
            .text("seconds", self.seconds.clone())
            .text("size", self.size.clone());

        if let Some(reference) = reference {
            let part = Part::bytes(reference.bytes.to_vec())
                .file_name(reference.file_name)
                .mime_str(&reference.content_type)
                .map_err(|e| ApiError::bad_request(format!("Invalid image type: {}", e)))?;
            form = form.part("input_reference", part);
        }

        let response = self
            .http
            .post(format!("{}/videos", self.base_url))
            .bearer_auth(key)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let job: VideoJob = read_json(response).await?;
        info!("Video engine accepted job {} ({})", job.id, job.status);
        Ok(job)
    }

    /// Current snapshot of a job
    pub async fn retrieve_video(&self, job_id: &str) -> ApiResult<VideoJob> {
        let key = self.key()?;
        let job_id = validate_job_id(job_id)?;

        let response = self
            .http
            .get(format!("{}/videos/{}", self.base_url, job_id))
            .bearer_auth(key)
            .send()
            .await
            .map_err(transport_error)?;

        read_json(response).await
    }

    /// Bytes of a completed job's MP4
    pub async fn download_content(&self, job_id: &str) -> ApiResult<Bytes> {
        let key = self.key()?;
        let job_id = validate_job_id(job_id)?;

        let response = self
            .http
            .get(format!("{}/videos/{}/content", self.base_url, job_id))
            .bearer_auth(key)
            .send()
            .await
            .map_err(transport_error)?;

        let response = relay_errors(ENGINE_NAME, response).await?;
        response.bytes().await.map_err(transport_error)
    }
}

/// Pass an engine's non-success answer through with its status code
pub(crate) async fn relay_errors(engine: &str, response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!("{} API error: {} {}", engine, status, body);
    Err(ApiError::Upstream {
        status: status.as_u16(),
        message: format!("{} API error: {}", engine, body),
    })
}

pub(crate) fn upstream_unreachable(engine: &str, e: reqwest::Error) -> ApiError {
    error!("{} request failed: {}", engine, e);
    ApiError::Upstream {
        status: 502,
        message: format!("{} API error: {}", engine, e),
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    upstream_unreachable(ENGINE_NAME, e)
}

async fn read_json(response: Response) -> ApiResult<VideoJob> {
    let response = relay_errors(ENGINE_NAME, response).await?;
    response.json().await.map_err(|e| {
        error!("Unexpected video engine response: {}", e);
        ApiError::Upstream {
            status: 502,
            message: format!("{} API error: unexpected response", ENGINE_NAME),
        }
    })
}
