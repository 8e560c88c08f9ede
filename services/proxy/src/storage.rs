//! Durable storage of finished videos

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{Client, primitives::ByteStream};
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::config::{StorageBackend, StorageConfig};

#[derive(Error, Debug)]
pub enum StorageError {
    /// The key is already taken; objects are never overwritten
    #[error("Object {0} already exists")]
    AlreadyExists(String),

    #[error("{0}")]
    Backend(String),
}

/// Write-once object store
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `body` under `key`, failing if the key exists
    async fn put_new(&self, key: &str, body: Bytes, content_type: &str)
    -> Result<(), StorageError>;
}

/// Build the store selected by `config`
pub async fn from_config(config: &StorageConfig) -> Arc<dyn ObjectStorage> {
    match config.backend {
        StorageBackend::S3 => Arc::new(S3Storage::from_config(config).await),
        StorageBackend::Memory => Arc::new(MemoryStorage::default()),
    }
}

/// S3-compatible bucket
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3 storage over an existing client
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Create a client from the ambient AWS configuration
    pub async fn from_config(config: &StorageConfig) -> Self {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        Self::new(Client::from_conf(builder.build()), &config.bucket)
    }
}

/// S3 answers a failed `If-None-Match: *` with 412, or 409 while a
/// concurrent conditional write to the same key is in flight
fn is_conditional_write_rejection(status: u16) -> bool {
    status == 412 || status == 409
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put_new(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .if_none_match("*")
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                let status = e.raw_response().map(|r| r.status().as_u16());
                if status.is_some_and(is_conditional_write_rejection) {
                    return StorageError::AlreadyExists(key.to_string());
                }
                let e = e.into_service_error();
                error!("Failed to upload {} to {}: {}", key, self.bucket, e);
                StorageError::Backend(e.to_string())
            })?;

        info!("Uploaded {} ({} bytes) to bucket {}", key, size, self.bucket);
        Ok(())
    }
}

/// Process-local store for development and tests
#[derive(Clone, Default)]
pub struct MemoryStorage {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
}

impl MemoryStorage {
    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put_new(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let mut objects = self.objects.write().await;
        if objects.contains_key(key) {
            return Err(StorageError::AlreadyExists(key.to_string()));
        }
        objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
