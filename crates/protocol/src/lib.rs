//! # VneFiles Protocol Library
//!
//! Wire types shared between the VneFiles client and the file-exchange
//! service.
//!
//! ## Overview
//!
//! - **Domain records**: [`Identity`], [`FileRecord`], [`ProfileData`]
//! - **Messages**: request and response bodies for the auth, files, upload
//!   and profile endpoints
//! - **Encoding**: base64 transport encoding of uploaded file content
//!
//! ## Example Usage
//!
//! ```rust
//! use protocol::{AuthRequest, UserType};
//!
//! let request = AuthRequest::register("a@x.com", "p1", UserType::Special, Some("669".into()));
//! let body = serde_json::to_string(&request).unwrap();
//! assert!(body.contains("\"action\":\"register\""));
//! ```
//!
//! ## Modules
//!
//! - [`types`]: domain records
//! - [`messages`]: endpoint bodies
//! - [`encoding`]: file content encoding
//! - [`error`]: error types

pub mod encoding;
pub mod error;
pub mod messages;
pub mod types;

pub use encoding::{decode_file_content, encode_file_content};
pub use error::{ProtocolError, Result};
pub use messages::{
    AuthAction, AuthRequest, DownloadAck, DownloadRequest, ErrorBody, FileListResponse,
    FilesAction, MessageAck, ProfileQuery, ProfileUpdate, UploadReceipt, UploadRequest,
};
pub use types::{
    format_file_size, FileRecord, Identity, ProfileData, ProfileStats, UserType,
    DEFAULT_MIME_TYPE,
};
