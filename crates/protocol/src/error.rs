//! Error types for the protocol crate.

use thiserror::Error;

/// Wire-level error covering encoding and decoding of service payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Failed to serialize a request body.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Failed to deserialize a response body.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// File content was not valid base64.
    #[error("invalid file content encoding: {0}")]
    InvalidContent(String),

    /// The user type string is not one the service knows.
    #[error("unknown user type: {0}")]
    UnknownUserType(String),
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_eof() || err.is_syntax() {
            ProtocolError::Deserialization(err.to_string())
        } else {
            ProtocolError::Serialization(err.to_string())
        }
    }
}

impl From<base64::DecodeError> for ProtocolError {
    fn from(err: base64::DecodeError) -> Self {
        ProtocolError::InvalidContent(err.to_string())
    }
}
