//! Transport encoding for uploaded file content.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::Result;

/// Encode raw file bytes for the `file_content` field of an upload.
pub fn encode_file_content(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode the `file_content` field back into bytes.
pub fn decode_file_content(encoded: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(encoded)?)
}
