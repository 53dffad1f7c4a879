//! Remote gateway to the VneFiles service.
//!
//! The [`Gateway`] trait is the only way the client reaches the service.
//! Every call is independent: no retry, no backoff, no deduplication, and no
//! ordering between concurrent calls.

mod http;
mod memory;

use async_trait::async_trait;
use protocol::{
    AuthRequest, DownloadAck, FileRecord, Identity, MessageAck, ProfileData, ProfileUpdate,
    UploadReceipt, UploadRequest,
};
use thiserror::Error;

pub use http::HttpGateway;
pub use memory::{GatewayCalls, InMemoryGateway, DEFAULT_SPECIAL_CODE, STORAGE_BASE_URL};

/// Errors surfaced by a gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The service refused the request and said why.
    #[error("rejected by service (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a usable response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service answered 2xx with a body that does not decode.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// Shorthand for a rejection.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        GatewayError::Rejected {
            status,
            message: message.into(),
        }
    }
}

/// Result type for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Typed request/response functions for the service endpoints.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Log in or register, depending on `request.action`.
    async fn authenticate(&self, request: AuthRequest) -> GatewayResult<Identity>;

    /// Fetch the shared file listing in server order.
    async fn list_files(&self) -> GatewayResult<Vec<FileRecord>>;

    /// Count one download of `file_id`. Each call counts again.
    async fn record_download(&self, file_id: i64) -> GatewayResult<DownloadAck>;

    /// Upload a whole file whose content is already base64-encoded.
    async fn upload_file(&self, request: UploadRequest) -> GatewayResult<UploadReceipt>;

    /// Fetch one user's profile with stats.
    async fn get_profile(&self, user_id: i64) -> GatewayResult<ProfileData>;

    /// Overwrite a profile's editable fields. Re-fetch to observe the result.
    async fn update_profile(&self, update: ProfileUpdate) -> GatewayResult<MessageAck>;
}
