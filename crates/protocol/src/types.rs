//! Domain records exchanged with the file-exchange service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ProtocolError;

/// MIME type used when the uploaded file's type is unknown.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Account type. Only special accounts may upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Regular,
    Special,
}

impl UserType {
    /// Returns the wire name of this user type.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Regular => "regular",
            UserType::Special => "special",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(UserType::Regular),
            "special" => Ok(UserType::Special),
            other => Err(ProtocolError::UnknownUserType(other.to_string())),
        }
    }
}

/// The authenticated user as returned by login and register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub email: String,
    pub user_type: UserType,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_verified: bool,
}

impl Identity {
    /// Whether this identity may upload files.
    pub fn can_upload(&self) -> bool {
        self.user_type == UserType::Special
    }

    /// Whether this identity owns the profile with the given id.
    pub fn owns_profile(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

/// One shared file in the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub filename: String,
    pub file_url: String,
    pub file_size: u64,
    pub mime_type: String,
    pub downloads_count: u64,
    /// ISO-8601 timestamp assigned by the service.
    #[serde(default)]
    pub created_at: Option<String>,
    pub uploader_id: i64,
    pub uploader_email: String,
    pub uploader_type: UserType,
    #[serde(default, deserialize_with = "null_as_false")]
    pub uploader_verified: bool,
}

impl FileRecord {
    /// Human-readable file size, e.g. `"1.5 KB"`.
    pub fn display_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// Aggregate stats shown on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileStats {
    pub files_count: u64,
    pub total_downloads: u64,
}

/// A user's public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileData {
    pub user_id: i64,
    pub email: String,
    pub user_type: UserType,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_verified: bool,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub stats: ProfileStats,
}

/// Formats a byte count the way the file browser displays it.
///
/// Below 1024 bytes the exact count is shown; larger values use one decimal
/// place in KB or MB.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

// The service returns `null` for accounts created before verification existed.
fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
