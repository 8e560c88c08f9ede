//! HTTP client for the FrameLab proxy
//!
//! Every call goes to the same-origin proxy, which holds the credentials for
//! the video, speech and image engines. The client never retries: a
//! non-success response is surfaced once, carrying the proxy's error text.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    Response,
    multipart::{Form, Part},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{error, info};

use crate::config::StudioConfig;
use crate::error::{StudioError, StudioResult};
use crate::image_prep::{PreparedImage, REFERENCE_RESOLUTION};
use crate::job::{VideoJob, VideoResult};
use crate::poller::JobStatusSource;
use crate::wire::{
    CHECK_VIDEO_STATUS_PATH, CREATE_VIDEO_PATH, DOWNLOAD_VIDEO_PATH, DownloadVideoRequest,
    ErrorBody, GENERATE_SCENE_IMAGE_PATH, SceneImageRequest, SceneImageResponse, SpeechRequest,
    TEXT_TO_SPEECH_PATH, VideoIdRequest,
};

/// The three calls of a video generation
#[async_trait]
pub trait VideoJobApi: JobStatusSource {
    /// Submit a new job. Not idempotent: every call creates a billable job.
    async fn create_video_job(
        &self,
        prompt: &str,
        image: Option<&PreparedImage>,
    ) -> StudioResult<VideoJob>;

    /// Fetch a completed job's video and persist it to storage
    async fn download_and_store_video(
        &self,
        job_id: &str,
        prompt: Option<&str>,
    ) -> StudioResult<VideoResult>;
}

/// AI generation and editing of storyboard images
#[async_trait]
pub trait SceneImageApi: Send + Sync {
    /// Returns the new image as a data URL
    async fn generate_scene_image(&self, request: &SceneImageRequest) -> StudioResult<String>;
}

/// Client for the FrameLab proxy
#[derive(Debug, Clone)]
pub struct VideoJobClient {
    http: reqwest::Client,
    base_url: String,
}

impl VideoJobClient {
    /// Create a client for the proxy at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing HTTP client
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from configuration
    pub fn from_config(config: &StudioConfig) -> StudioResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_http(http, &config.proxy_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Submit a prompt and optional reference image
    pub async fn create_video_job(
        &self,
        prompt: &str,
        image: Option<&PreparedImage>,
    ) -> StudioResult<VideoJob> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(StudioError::validation("Please enter a prompt"));
        }

        if let Some(image) = image.filter(|i| i.resolution() != REFERENCE_RESOLUTION) {
            return Err(StudioError::validation(format!(
                "Reference image must be {}, got {}",
                REFERENCE_RESOLUTION,
                image.resolution()
            )));
        }

        let mut form = Form::new().text("prompt", prompt.to_string());
        if let Some(image) = image {
            let part = Part::bytes(image.bytes().to_vec())
                .file_name(image.file_name())
                .mime_str(image.content_type())?;
            form = form.part("image", part);
        }

        info!(
            "Creating video job with prompt: {} (reference image: {})",
            prompt,
            image.is_some()
        );

        let response = self
            .http
            .post(self.endpoint(CREATE_VIDEO_PATH))
            .multipart(form)
            .send()
            .await?;

        let job: VideoJob = read_json(response, "create video").await?;
        info!("Video job {} created ({})", job.id, job.status);
        Ok(job)
    }

    /// Fetch the current snapshot of a job
    pub async fn check_video_status(&self, job_id: &str) -> StudioResult<VideoJob> {
        self.post_json(
            CHECK_VIDEO_STATUS_PATH,
            &VideoIdRequest {
                video_id: job_id.to_string(),
            },
            "check video status",
        )
        .await
    }

    /// Persist a completed job's video, returning its public URL
    pub async fn download_and_store_video(
        &self,
        job_id: &str,
        prompt: Option<&str>,
    ) -> StudioResult<VideoResult> {
        let result: VideoResult = self
            .post_json(
                DOWNLOAD_VIDEO_PATH,
                &DownloadVideoRequest {
                    video_id: job_id.to_string(),
                    prompt: prompt.map(str::to_string),
                },
                "download video",
            )
            .await?;

        info!("Video {} stored at {}", job_id, result.public_url);
        Ok(result)
    }

    /// Synthesise `text` as MPEG audio
    pub async fn text_to_speech(&self, text: &str, voice_id: Option<&str>) -> StudioResult<Bytes> {
        if text.trim().is_empty() {
            return Err(StudioError::validation("Text is required"));
        }

        let response = self
            .http
            .post(self.endpoint(TEXT_TO_SPEECH_PATH))
            .json(&SpeechRequest {
                text: text.to_string(),
                voice_id: voice_id.map(str::to_string),
            })
            .send()
            .await?;

        let response = check_status(response, "text to speech").await?;
        Ok(response.bytes().await?)
    }

    /// Generate or edit a storyboard image
    pub async fn generate_scene_image(&self, request: &SceneImageRequest) -> StudioResult<String> {
        let response: SceneImageResponse = self
            .post_json(GENERATE_SCENE_IMAGE_PATH, request, "generate scene image")
            .await?;
        Ok(response.image_url)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B, operation: &str) -> StudioResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await?;

        read_json(response, operation).await
    }
}

/// Turn a non-success response into [`StudioError::Api`]
async fn check_status(response: Response, operation: &str) -> StudioResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    error!("Proxy {} failed: {} {}", operation, status, message);
    Err(StudioError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<R: DeserializeOwned>(response: Response, operation: &str) -> StudioResult<R> {
    let response = check_status(response, operation).await?;
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

#[async_trait]
impl JobStatusSource for VideoJobClient {
    async fn check_video_status(&self, job_id: &str) -> StudioResult<VideoJob> {
        VideoJobClient::check_video_status(self, job_id).await
    }
}

#[async_trait]
impl VideoJobApi for VideoJobClient {
    async fn create_video_job(
        &self,
        prompt: &str,
        image: Option<&PreparedImage>,
    ) -> StudioResult<VideoJob> {
        VideoJobClient::create_video_job(self, prompt, image).await
    }

    async fn download_and_store_video(
        &self,
        job_id: &str,
        prompt: Option<&str>,
    ) -> StudioResult<VideoResult> {
        VideoJobClient::download_and_store_video(self, job_id, prompt).await
    }
}

#[async_trait]
impl SceneImageApi for VideoJobClient {
    async fn generate_scene_image(&self, request: &SceneImageRequest) -> StudioResult<String> {
        VideoJobClient::generate_scene_image(self, request).await
    }
}
