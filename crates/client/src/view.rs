//! View states, the action set and the render model.

use protocol::{FileRecord, Identity, ProfileData, UserType};
use serde::{Deserialize, Serialize};

use crate::profile::{ProfileDraft, ProfileStatus};

/// Message shown in the browser when the listing is empty.
pub const EMPTY_LISTING_MESSAGE: &str = "No files uploaded yet";

/// Which screen the client is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "user_id", rename_all = "snake_case")]
pub enum ViewState {
    Unauthenticated,
    Browsing,
    ViewingProfile(i64),
}

impl ViewState {
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, ViewState::Unauthenticated)
    }
}

/// A user-triggerable operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Login,
    Register,
    Logout,
    RefreshFiles,
    SelectFile,
    Upload,
    Download,
    ViewProfile,
    BackToFiles,
    EditProfile,
    EditDraft,
    SaveProfile,
    CancelEdit,
}

// ============================================================================
// Render Model
// ============================================================================

/// Snapshot of what the current screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    Auth(AuthScreen),
    Browser(BrowserScreen),
    Profile(ProfileScreen),
}

/// Login and registration forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthScreen {
    /// Account type chosen in the registration form.
    pub register_user_type: UserType,
    /// The special code field is shown only for special registrations.
    pub show_special_code: bool,
}

impl AuthScreen {
    pub fn for_user_type(user_type: UserType) -> Self {
        Self {
            register_user_type: user_type,
            show_special_code: user_type == UserType::Special,
        }
    }
}

/// The shared file listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserScreen {
    pub identity: Identity,
    pub files: Vec<FileRecord>,
    pub file_count: usize,
    /// Present only when the listing is empty.
    pub empty_state: Option<String>,
    /// Present only for identities that may upload.
    pub upload_panel: Option<UploadPanel>,
}

/// Upload controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPanel {
    pub pending_name: Option<String>,
    pub pending_size: Option<String>,
    pub upload_enabled: bool,
}

/// One user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileScreen {
    pub user_id: i64,
    pub status: ProfileStatus,
    pub profile: Option<ProfileData>,
    /// Edit controls are shown.
    pub editable: bool,
    pub editing: bool,
    pub draft: ProfileDraft,
}
