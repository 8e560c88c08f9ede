//! `data:` URLs carrying base64 image payloads

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::{StudioError, StudioResult};

/// A decoded data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Encode `bytes` as `data:<mime>;base64,<payload>`
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Decode a base64 data URL
///
/// A bare base64 payload without the `data:` prefix is accepted and treated
/// as PNG.
pub fn decode_data_url(value: &str) -> StudioResult<DataUrl> {
    let value = value.trim();

    let (mime_type, payload) = match value.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| StudioError::validation("Malformed data URL"))?;
            let mime_type = header
                .strip_suffix(";base64")
                .ok_or_else(|| StudioError::validation("Data URL must be base64 encoded"))?;
            (mime_type, payload)
        }
        None => ("image/png", value),
    };

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| StudioError::validation(format!("Invalid base64 image data: {}", e)))?;

    if bytes.is_empty() {
        return Err(StudioError::validation("Image data is empty"));
    }

    Ok(DataUrl {
        mime_type: mime_type.to_string(),
        bytes,
    })
}
