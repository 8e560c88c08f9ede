//! Route behaviour against mocked engines

mod support;

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use support::{body_has, job_json, jpeg, start, start_with};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn error_of(response: reqwest::Response) -> (StatusCode, String) {
    let status = response.status();
    let body: Value = response.json().await.unwrap();
    (status, body["error"].as_str().unwrap_or_default().to_string())
}

fn image_part(bytes: Vec<u8>) -> Part {
    Part::bytes(bytes)
        .file_name("reference.jpg")
        .mime_str("image/jpeg")
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_service() {
    let upstream = MockServer::start().await;
    let proxy = start(&upstream).await;

    let body: Value = reqwest::get(proxy.url("/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"status": "ok", "service": "proxy"}));
}

#[tokio::test]
async fn test_create_requires_prompt() {
    let upstream = MockServer::start().await;
    let proxy = start(&upstream).await;

    let form = Form::new().text("prompt", "   ");
    let response = reqwest::Client::new()
        .post(proxy.url("/api/create-video"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(
        error_of(response).await,
        (StatusCode::BAD_REQUEST, "Prompt is required".to_string())
    );
}

#[tokio::test]
async fn test_create_rejects_unprepared_image() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    let proxy = start(&upstream).await;

    let form = Form::new()
        .text("prompt", "rotate slowly")
        .part("image", image_part(jpeg(3000, 2000)));
    let response = reqwest::Client::new()
        .post(proxy.url("/api/create-video"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    let (status, message) = error_of(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message, "Reference image must be 1280x720, got 3000x2000");
}

#[tokio::test]
async fn test_create_forwards_fixed_engine_parameters() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/videos"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_has(b"sora-2"))
        .and(body_has(b"name=\"seconds\""))
        .and(body_has(b"1280x720"))
        .and(body_has(b"name=\"input_reference\""))
        .and(body_has(b"rotate slowly"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("video_1", "queued", 0)))
        .expect(1)
        .mount(&upstream)
        .await;
    let proxy = start(&upstream).await;

    let form = Form::new()
        .text("prompt", "rotate slowly")
        .part("image", image_part(jpeg(1280, 720)));
    let response = reqwest::Client::new()
        .post(proxy.url("/api/create-video"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let job: Value = response.json().await.unwrap();
    assert_eq!(job["id"], "video_1");
    assert_eq!(job["status"], "queued");
}

#[tokio::test]
async fn test_status_requires_valid_video_id() {
    let upstream = MockServer::start().await;
    let proxy = start(&upstream).await;
    let client = reqwest::Client::new();

    let response = client
        .post(proxy.url("/api/check-video-status"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(
        error_of(response).await,
        (StatusCode::BAD_REQUEST, "videoId is required".to_string())
    );

    let response = client
        .post(proxy.url("/api/check-video-status"))
        .json(&json!({"videoId": "../../files"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_engine_errors_are_relayed_with_status() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos/video_gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("video not found"))
        .mount(&upstream)
        .await;
    let proxy = start(&upstream).await;

    let response = reqwest::Client::new()
        .post(proxy.url("/api/check-video-status"))
        .json(&json!({"videoId": "video_gone"}))
        .send()
        .await
        .unwrap();

    assert_eq!(
        error_of(response).await,
        (
            StatusCode::NOT_FOUND,
            "OpenAI API error: video not found".to_string()
        )
    );
}

#[tokio::test]
async fn test_missing_engine_key_is_reported() {
    let upstream = MockServer::start().await;
    let proxy = start_with(&upstream, &[("FRAMELAB_ENGINE__API_KEY", "")]).await;

    let response = reqwest::Client::new()
        .post(proxy.url("/api/check-video-status"))
        .json(&json!({"videoId": "video_1"}))
        .send()
        .await
        .unwrap();

    assert_eq!(
        error_of(response).await,
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "OPENAI_API_KEY is not configured".to_string()
        )
    );
}

#[tokio::test]
async fn test_download_refuses_unfinished_jobs() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos/video_busy"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(job_json("video_busy", "in_progress", 40)),
        )
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos/video_busy/content"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    let proxy = start(&upstream).await;

    let response = reqwest::Client::new()
        .post(proxy.url("/api/download-video"))
        .json(&json!({"videoId": "video_busy"}))
        .send()
        .await
        .unwrap();

    let (status, message) = error_of(response).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(message.contains("in_progress"));
    assert!(proxy.storage.keys().await.is_empty());
}

#[tokio::test]
async fn test_download_stores_mp4_under_timestamped_key() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos/video_done"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(job_json("video_done", "completed", 100)),
        )
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos/video_done/content"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\0\0\0\x18ftypmp42".to_vec()))
        .mount(&upstream)
        .await;
    let proxy = start(&upstream).await;

    let response = reqwest::Client::new()
        .post(proxy.url("/api/download-video"))
        .json(&json!({"videoId": "video_done", "prompt": "rotate slowly"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let result: studio::VideoResult = response.json().await.unwrap();

    assert!(result.success);
    assert_eq!(result.video_id, "video_done");
    let millis = result
        .file_path
        .strip_prefix("video_done-")
        .and_then(|rest| rest.strip_suffix(".mp4"))
        .unwrap();
    assert!(millis.parse::<i64>().unwrap() > 0);
    assert_eq!(
        result.public_url,
        format!("{}/{}", support::PUBLIC_BASE_URL, result.file_path)
    );

    let stored = proxy.storage.get(&result.file_path).await.unwrap();
    assert_eq!(stored.content_type, "video/mp4");
    assert_eq!(&stored.body[4..8], b"ftyp");
}

#[tokio::test]
async fn test_speech_uses_default_voice_and_returns_audio() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/text-to-speech/NBqeXKdZHweef6y0B67V"))
        .and(header("xi-api-key", "xi-test"))
        .and(body_partial_json(json!({"text": "Ready to level up?"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(b"ID3\x04mp3".to_vec()),
        )
        .expect(1)
        .mount(&upstream)
        .await;
    let proxy = start(&upstream).await;

    let response = reqwest::Client::new()
        .post(proxy.url("/api/text-to-speech"))
        .json(&json!({"text": "Ready to level up?"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "audio/mpeg");
    assert_eq!(&response.bytes().await.unwrap()[..], b"ID3\x04mp3");
}

#[tokio::test]
async fn test_speech_requires_text() {
    let upstream = MockServer::start().await;
    let proxy = start(&upstream).await;

    let response = reqwest::Client::new()
        .post(proxy.url("/api/text-to-speech"))
        .json(&json!({"text": ""}))
        .send()
        .await
        .unwrap();

    assert_eq!(
        error_of(response).await,
        (StatusCode::BAD_REQUEST, "Text is required".to_string())
    );
}

#[tokio::test]
async fn test_scene_image_generation_returns_data_url() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-image-1", "prompt": "Office intro"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"b64_json": "AQID"}]})),
        )
        .mount(&upstream)
        .await;
    let proxy = start(&upstream).await;

    let body: Value = reqwest::Client::new()
        .post(proxy.url("/api/generate-scene-image"))
        .json(&json!({"prompt": "Office intro"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["imageUrl"], "data:image/png;base64,AQID");
}

#[tokio::test]
async fn test_scene_image_change_sends_existing_image() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images/edits"))
        .and(body_has(b"name=\"image\""))
        .and(body_has(b"Change: make it night"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"b64_json": "BAUG"}]})),
        )
        .expect(1)
        .mount(&upstream)
        .await;
    let proxy = start(&upstream).await;
    let client = reqwest::Client::new();

    let response = client
        .post(proxy.url("/api/generate-scene-image"))
        .json(&json!({"prompt": "Office intro", "changeInstruction": "make it night"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = client
        .post(proxy.url("/api/generate-scene-image"))
        .json(&json!({
            "prompt": "Office intro",
            "changeInstruction": "make it night",
            "existingImageBase64": "data:image/png;base64,AQID"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["imageUrl"], "data:image/png;base64,BAUG");
}

#[tokio::test]
async fn test_history_is_unavailable_without_database() {
    let upstream = MockServer::start().await;
    let proxy = start(&upstream).await;

    let response = reqwest::get(proxy.url("/api/history?limit=5")).await.unwrap();
    assert_eq!(
        error_of(response).await,
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "History is not enabled".to_string()
        )
    );
}
