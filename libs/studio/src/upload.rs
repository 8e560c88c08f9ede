//! Product image selected in the upload form

use std::fmt;

use bytes::Bytes;
use image::ImageFormat;
use uuid::Uuid;

use crate::error::{StudioError, StudioResult};

/// Largest upload accepted before preparation
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Transient reference to an upload held by the current form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalRef(String);

impl LocalRef {
    fn new(filename: &str) -> Self {
        Self(format!("local://{}/{}", Uuid::new_v4(), filename))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An image the user picked, validated but not yet resized
#[derive(Debug, Clone)]
pub struct UploadedImage {
    url: LocalRef,
    filename: String,
    content_type: &'static str,
    bytes: Bytes,
}

impl UploadedImage {
    /// Validate a picked file
    ///
    /// Only JPEG, PNG and WebP payloads up to [`MAX_UPLOAD_BYTES`] are
    /// accepted; the format is sniffed from the content, not the file name.
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> StudioResult<Self> {
        let filename = filename.into();
        let bytes = bytes.into();

        if bytes.is_empty() {
            return Err(StudioError::validation("Please upload an image file"));
        }

        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(StudioError::validation("Image must be smaller than 10 MB"));
        }

        let content_type = match image::guess_format(&bytes) {
            Ok(ImageFormat::Jpeg) => "image/jpeg",
            Ok(ImageFormat::Png) => "image/png",
            Ok(ImageFormat::WebP) => "image/webp",
            _ => {
                return Err(StudioError::validation(
                    "Please upload a JPEG, PNG or WebP image",
                ));
            }
        };

        Ok(Self {
            url: LocalRef::new(&filename),
            filename,
            content_type,
            bytes,
        })
    }

    pub fn url(&self) -> &LocalRef {
        &self.url
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}
