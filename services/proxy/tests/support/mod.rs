//! Shared harness: a real proxy on an ephemeral port with in-memory storage
#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, Rgb, RgbImage};
use proxy::{AppState, config::ProxyConfig, create_router, storage::MemoryStorage};
use tokio::net::TcpListener;
use wiremock::{MockServer, Request};

pub const PUBLIC_BASE_URL: &str = "https://cdn.example.com/videos";

pub struct TestProxy {
    pub base_url: String,
    pub storage: MemoryStorage,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Proxy whose engines all point at `upstream`
pub async fn start(upstream: &MockServer) -> TestProxy {
    start_with(upstream, &[]).await
}

/// Like [`start`], with extra `FRAMELAB_*` overrides
pub async fn start_with(upstream: &MockServer, extra: &[(&str, &str)]) -> TestProxy {
    let uri = upstream.uri();
    let mut vars: Vec<(String, String)> = vec![
        ("FRAMELAB_ENGINE__BASE_URL".into(), uri.clone()),
        ("FRAMELAB_ENGINE__API_KEY".into(), "sk-test".into()),
        ("FRAMELAB_IMAGES__BASE_URL".into(), uri.clone()),
        ("FRAMELAB_SPEECH__BASE_URL".into(), uri),
        ("FRAMELAB_SPEECH__API_KEY".into(), "xi-test".into()),
        ("FRAMELAB_STORAGE__BACKEND".into(), "memory".into()),
        ("FRAMELAB_STORAGE__PUBLIC_BASE_URL".into(), PUBLIC_BASE_URL.into()),
    ];
    vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    let config = ProxyConfig::from_environment(ProxyConfig::environment_from(vars)).unwrap();
    let storage = MemoryStorage::default();
    let state = AppState::new(&config, Arc::new(storage.clone()), None).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });

    TestProxy {
        base_url: format!("http://{}", addr),
        storage,
    }
}

/// Solid-colour JPEG of the given size
pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([180, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Jpeg).unwrap();
    out.into_inner()
}

/// Matcher over raw request bytes; multipart bodies are not UTF-8
pub fn body_has(needle: &'static [u8]) -> impl Fn(&Request) -> bool + Send + Sync {
    move |request: &Request| contains(&request.body, needle)
}

pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Engine job descriptor as returned by `/videos`
pub fn job_json(id: &str, status: &str, progress: u8) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "object": "video",
        "model": "sora-2",
        "status": status,
        "progress": progress,
        "seconds": "12",
        "size": "1280x720",
        "created_at": 1_760_000_000
    })
}
