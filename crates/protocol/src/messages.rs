//! Request and response bodies for the VneFiles service endpoints.
//!
//! Every endpoint speaks JSON. Successful responses use HTTP 200; failures
//! use a non-200 status with an [`ErrorBody`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{FileRecord, UserType};

// ============================================================================
// Auth
// ============================================================================

/// Which auth operation a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthAction {
    Login,
    Register,
}

/// Body of `POST <auth_url>`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    pub action: AuthAction,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user_type: Option<UserType>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub special_code: Option<String>,
}

impl AuthRequest {
    /// Build a login request.
    pub fn login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            action: AuthAction::Login,
            email: email.into(),
            password: password.into(),
            user_type: None,
            special_code: None,
        }
    }

    /// Build a register request.
    ///
    /// The special code only travels with `UserType::Special`; the service
    /// decides whether it is valid.
    pub fn register(
        email: impl Into<String>,
        password: impl Into<String>,
        user_type: UserType,
        special_code: Option<String>,
    ) -> Self {
        let special_code = match user_type {
            UserType::Special => special_code,
            UserType::Regular => None,
        };
        Self {
            action: AuthAction::Register,
            email: email.into(),
            password: password.into(),
            user_type: Some(user_type),
            special_code,
        }
    }
}

impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthRequest")
            .field("action", &self.action)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("user_type", &self.user_type)
            .field("special_code", &self.special_code.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ============================================================================
// Files
// ============================================================================

/// Body of `GET <files_url>`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<FileRecord>,
}

/// Actions accepted by `POST <files_url>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilesAction {
    Download,
}

/// Body of `POST <files_url>` recording one download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub action: FilesAction,
    pub file_id: i64,
}

impl DownloadRequest {
    pub fn new(file_id: i64) -> Self {
        Self {
            action: FilesAction::Download,
            file_id,
        }
    }
}

/// Acknowledgement of a recorded download.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DownloadAck {
    #[serde(default)]
    pub file_url: Option<String>,
}

// ============================================================================
// Upload
// ============================================================================

/// Body of `POST <upload_url>`. `file_content` is standard base64.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub user_id: i64,
    pub filename: String,
    pub file_content: String,
    pub mime_type: String,
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("user_id", &self.user_id)
            .field("filename", &self.filename)
            .field("file_content_len", &self.file_content.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Successful upload response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub file_id: Option<i64>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub message: String,
}

// ============================================================================
// Profile
// ============================================================================

/// Query string of `GET <profile_url>?user_id=<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileQuery {
    pub user_id: i64,
}

/// Body of `POST <profile_url>`. Absent fields are sent as explicit `null`
/// because the service overwrites all three columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub user_id: i64,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// Generic `{message}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageAck {
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Errors
// ============================================================================

/// Body of every non-200 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
