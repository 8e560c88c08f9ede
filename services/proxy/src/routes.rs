//! Proxy service routes

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;
use studio::image_prep::{REFERENCE_CONTENT_TYPE, REFERENCE_FILE_NAME, REFERENCE_RESOLUTION};
use studio::wire::{
    CHECK_VIDEO_STATUS_PATH, CREATE_VIDEO_PATH, DOWNLOAD_VIDEO_PATH, DownloadVideoRequest,
    GENERATE_SCENE_IMAGE_PATH, HISTORY_PATH, SceneImageRequest, SceneImageResponse,
    SpeechRequest, TEXT_TO_SPEECH_PATH, VideoIdRequest,
};
use studio::{JobStatus, VideoResult};
use tracing::{error, info, warn};

use crate::{
    AppState,
    engine::ReferenceImage,
    error::ApiError,
    models::{HistoryQuery, HistoryResponse, NewGeneration},
    storage::StorageError,
};

const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Create the router for the proxy service
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.body_limit;

    Router::new()
        .route("/health", get(health_check))
        .route(CREATE_VIDEO_PATH, post(create_video))
        .route(CHECK_VIDEO_STATUS_PATH, post(check_video_status))
        .route(DOWNLOAD_VIDEO_PATH, post(download_video))
        .route(TEXT_TO_SPEECH_PATH, post(text_to_speech))
        .route(GENERATE_SCENE_IMAGE_PATH, post(generate_scene_image))
        .route(HISTORY_PATH, get(get_history))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "proxy"
    }))
}

/// Submit a prompt and optional 1280x720 reference image to the video engine
pub async fn create_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut prompt = None;
    let mut reference = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid form data: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("prompt") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid prompt: {}", e)))?;
                prompt = Some(text);
            }
            Some("image") => {
                let file_name = field
                    .file_name()
                    .unwrap_or(REFERENCE_FILE_NAME)
                    .to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(REFERENCE_CONTENT_TYPE)
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid image: {}", e)))?;
                if !bytes.is_empty() {
                    reference = Some(ReferenceImage {
                        bytes,
                        file_name,
                        content_type,
                    });
                }
            }
            _ => {}
        }
    }

    let prompt = prompt
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("Prompt is required"))?;

    if let Some(reference) = &reference {
        let resolution = studio::image_prep::reference_dimensions(&reference.bytes)
            .map_err(|_| ApiError::bad_request("Reference image could not be read"))?;
        if resolution != REFERENCE_RESOLUTION {
            return Err(ApiError::bad_request(format!(
                "Reference image must be {}, got {}",
                REFERENCE_RESOLUTION, resolution
            )));
        }
    }

    info!(
        "Creating video with prompt: {} (reference image: {})",
        prompt,
        reference.is_some()
    );

    let job = state.engine.create_video(&prompt, reference).await?;
    Ok(Json(job))
}

/// Relay the engine's current snapshot of a job
pub async fn check_video_status(
    State(state): State<AppState>,
    Json(payload): Json<VideoIdRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = required_video_id(&payload.video_id)?;
    let job = state.engine.retrieve_video(video_id).await?;
    info!("Video {} status: {}", job.id, job.status);
    Ok(Json(job))
}

/// Copy a completed job's MP4 into durable storage
pub async fn download_video(
    State(state): State<AppState>,
    Json(payload): Json<DownloadVideoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let video_id = required_video_id(&payload.video_id)?;

    let job = state.engine.retrieve_video(video_id).await?;
    if job.status != JobStatus::Completed {
        return Err(ApiError::Conflict(format!(
            "Video is not ready yet (status: {})",
            job.status
        )));
    }

    let content = state.engine.download_content(video_id).await?;
    info!("Downloaded video {} ({} bytes)", video_id, content.len());

    let key = format!("{}-{}.mp4", video_id, Utc::now().timestamp_millis());
    state
        .storage
        .put_new(&key, content, VIDEO_CONTENT_TYPE)
        .await
        .map_err(|e| match e {
            StorageError::AlreadyExists(_) => ApiError::Conflict(e.to_string()),
            StorageError::Backend(message) => {
                error!("Failed to upload video {}: {}", key, message);
                ApiError::Storage(message)
            }
        })?;

    let public_url = state.storage_config.public_url(&key);

    if let Some(history) = &state.history {
        let generation = NewGeneration {
            video_url: public_url.clone(),
            prompt: payload
                .prompt
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            duration: job.duration_seconds(),
            model: job.model.clone(),
        };
        if let Err(e) = history.insert(&generation).await {
            // History is best effort once the video is stored
            warn!("Failed to record generation of {}: {}", video_id, e);
        }
    }

    info!("Stored video {} at {}", video_id, public_url);

    Ok(Json(VideoResult {
        success: true,
        file_path: key,
        public_url,
        video_id: video_id.to_string(),
    }))
}

/// Synthesise narration audio
pub async fn text_to_speech(
    State(state): State<AppState>,
    Json(payload): Json<SpeechRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let audio = state
        .speech
        .synthesize(&payload.text, payload.voice_id.as_deref())
        .await?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio))
}

/// Generate or edit a storyboard image
pub async fn generate_scene_image(
    State(state): State<AppState>,
    Json(payload): Json<SceneImageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let image_url = state.images.render(&payload).await?;
    Ok(Json(SceneImageResponse { image_url }))
}

/// Most recent stored videos
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let history = state.history.as_ref().ok_or(ApiError::HistoryDisabled)?;
    let limit = query.limit();

    let items = history.list_recent(limit).await.map_err(|e| {
        tracing::error!("Failed to list generation history: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(HistoryResponse { items, limit }))
}

fn required_video_id(video_id: &str) -> Result<&str, ApiError> {
    let video_id = video_id.trim();
    if video_id.is_empty() {
        return Err(ApiError::bad_request("videoId is required"));
    }
    crate::engine::validate_job_id(video_id)
}
