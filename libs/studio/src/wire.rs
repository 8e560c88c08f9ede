//! Request and response bodies of the proxy routes
//!
//! Both the client and the proxy use these types so the two sides cannot
//! drift apart.

use serde::{Deserialize, Serialize};

/// Route of the proxy that creates a video job
pub const CREATE_VIDEO_PATH: &str = "/api/create-video";
/// Route of the proxy that reads a job's status
pub const CHECK_VIDEO_STATUS_PATH: &str = "/api/check-video-status";
/// Route of the proxy that persists a finished video
pub const DOWNLOAD_VIDEO_PATH: &str = "/api/download-video";
/// Route of the proxy that synthesises speech
pub const TEXT_TO_SPEECH_PATH: &str = "/api/text-to-speech";
/// Route of the proxy that generates or edits a scene image
pub const GENERATE_SCENE_IMAGE_PATH: &str = "/api/generate-scene-image";
/// Route of the proxy listing past generations
pub const HISTORY_PATH: &str = "/api/history";

/// Body of a status check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoIdRequest {
    #[serde(default)]
    pub video_id: String,
}

/// Body of a download-and-store call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadVideoRequest {
    #[serde(default)]
    pub video_id: String,
    /// Prompt recorded alongside the stored video
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Body of a text-to-speech call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
}

/// Body of a scene image generation or edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneImageRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_instruction: Option<String>,
    /// Current image as a data URL, required with `change_instruction`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_image_base64: Option<String>,
}

/// Result of a scene image generation or edit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneImageResponse {
    /// Image as a data URL
    pub image_url: String,
}

/// Error envelope returned by every proxy route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
