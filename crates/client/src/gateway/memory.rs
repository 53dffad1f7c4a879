//! In-process stand-in for the VneFiles service.
//!
//! Reproduces the rules the real service applies that are observable through
//! its API, so the client can be exercised without a network. Passwords are
//! compared as given; password hashing is the service's business.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use protocol::{
    decode_file_content, AuthAction, AuthRequest, DownloadAck, FileRecord, Identity, MessageAck,
    ProfileData, ProfileStats, ProfileUpdate, UploadReceipt, UploadRequest, UserType,
};

use super::{Gateway, GatewayError, GatewayResult};

/// Registration code the service expects for special accounts.
pub const DEFAULT_SPECIAL_CODE: &str = "669";

/// Base URL of stored files.
pub const STORAGE_BASE_URL: &str = "https://storage.vnefiles.cloud";

/// Number of calls made to each gateway operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GatewayCalls {
    pub authenticate: usize,
    pub list_files: usize,
    pub record_download: usize,
    pub upload_file: usize,
    pub get_profile: usize,
    pub update_profile: usize,
}

struct UserRow {
    id: i64,
    email: String,
    password: String,
    user_type: UserType,
    is_verified: bool,
    full_name: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
    created_at: String,
}

struct FileRow {
    id: i64,
    user_id: i64,
    filename: String,
    file_url: String,
    file_size: u64,
    mime_type: String,
    downloads_count: u64,
    created_at: String,
}

#[derive(Default)]
struct ServiceState {
    users: Vec<UserRow>,
    /// Oldest first; listings reverse it.
    files: Vec<FileRow>,
    calls: GatewayCalls,
}

impl ServiceState {
    fn user(&self, user_id: i64) -> Option<&UserRow> {
        self.users.iter().find(|u| u.id == user_id)
    }

    fn next_user_id(&self) -> i64 {
        self.users.last().map_or(1, |u| u.id + 1)
    }

    fn next_file_id(&self) -> i64 {
        self.files.last().map_or(1, |f| f.id + 1)
    }
}

/// Gateway backed by in-process state.
pub struct InMemoryGateway {
    state: Mutex<ServiceState>,
    special_code: String,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    /// Create an empty service that accepts [`DEFAULT_SPECIAL_CODE`].
    pub fn new() -> Self {
        Self::with_special_code(DEFAULT_SPECIAL_CODE)
    }

    /// Create an empty service with a custom special registration code.
    pub fn with_special_code(code: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(ServiceState::default()),
            special_code: code.into(),
        }
    }

    /// How many times each operation has been called.
    pub fn calls(&self) -> GatewayCalls {
        self.lock().map(|s| s.calls).unwrap_or_default()
    }

    fn lock(&self) -> GatewayResult<MutexGuard<'_, ServiceState>> {
        self.state
            .lock()
            .map_err(|_| GatewayError::Transport("in-memory service unavailable".to_string()))
    }

    fn register(&self, state: &mut ServiceState, request: AuthRequest) -> GatewayResult<Identity> {
        let user_type = request.user_type.unwrap_or_default();

        if user_type == UserType::Special
            && request.special_code.as_deref() != Some(self.special_code.as_str())
        {
            return Err(GatewayError::rejected(400, "Invalid code for special user"));
        }

        if state.users.iter().any(|u| u.email == request.email) {
            return Err(GatewayError::rejected(400, "Email already registered"));
        }

        let row = UserRow {
            id: state.next_user_id(),
            email: request.email,
            password: request.password,
            user_type,
            is_verified: user_type == UserType::Special,
            full_name: None,
            bio: None,
            avatar_url: None,
            created_at: timestamp(),
        };
        let identity = identity_of(&row);
        state.users.push(row);
        Ok(identity)
    }

    fn login(state: &ServiceState, request: &AuthRequest) -> GatewayResult<Identity> {
        state
            .users
            .iter()
            .find(|u| u.email == request.email && u.password == request.password)
            .map(identity_of)
            .ok_or_else(|| GatewayError::rejected(401, "Invalid email or password"))
    }
}

#[async_trait]
impl Gateway for InMemoryGateway {
    async fn authenticate(&self, request: AuthRequest) -> GatewayResult<Identity> {
        let mut state = self.lock()?;
        state.calls.authenticate += 1;
        match request.action {
            AuthAction::Register => self.register(&mut state, request),
            AuthAction::Login => Self::login(&state, &request),
        }
    }

    async fn list_files(&self) -> GatewayResult<Vec<FileRecord>> {
        let mut state = self.lock()?;
        state.calls.list_files += 1;

        let records = state
            .files
            .iter()
            .rev()
            .filter_map(|file| {
                let uploader = state.user(file.user_id)?;
                Some(FileRecord {
                    id: file.id,
                    filename: file.filename.clone(),
                    file_url: file.file_url.clone(),
                    file_size: file.file_size,
                    mime_type: file.mime_type.clone(),
                    downloads_count: file.downloads_count,
                    created_at: Some(file.created_at.clone()),
                    uploader_id: uploader.id,
                    uploader_email: uploader.email.clone(),
                    uploader_type: uploader.user_type,
                    uploader_verified: uploader.is_verified,
                })
            })
            .collect();
        Ok(records)
    }

    async fn record_download(&self, file_id: i64) -> GatewayResult<DownloadAck> {
        let mut state = self.lock()?;
        state.calls.record_download += 1;

        let file = state
            .files
            .iter_mut()
            .find(|f| f.id == file_id)
            .ok_or_else(|| GatewayError::rejected(404, "File not found"))?;
        file.downloads_count += 1;
        Ok(DownloadAck {
            file_url: Some(file.file_url.clone()),
        })
    }

    async fn upload_file(&self, request: UploadRequest) -> GatewayResult<UploadReceipt> {
        let mut state = self.lock()?;
        state.calls.upload_file += 1;

        if request.user_id == 0 || request.filename.is_empty() || request.file_content.is_empty() {
            return Err(GatewayError::rejected(400, "Missing required fields"));
        }

        match state.user(request.user_id) {
            Some(user) if user.user_type == UserType::Special => {}
            _ => {
                return Err(GatewayError::rejected(
                    403,
                    "Only special users can upload files",
                ))
            }
        }

        let bytes = decode_file_content(&request.file_content)
            .map_err(|_| GatewayError::rejected(400, "Invalid file data"))?;

        let file_id = state.next_file_id();
        let file_url = format!(
            "{}/{}_{}",
            STORAGE_BASE_URL,
            uuid::Uuid::new_v4(),
            request.filename
        );
        state.files.push(FileRow {
            id: file_id,
            user_id: request.user_id,
            filename: request.filename,
            file_url: file_url.clone(),
            file_size: bytes.len() as u64,
            mime_type: request.mime_type,
            downloads_count: 0,
            created_at: timestamp(),
        });

        Ok(UploadReceipt {
            file_id: Some(file_id),
            file_url: Some(file_url),
            message: "File uploaded to cloud storage".to_string(),
        })
    }

    async fn get_profile(&self, user_id: i64) -> GatewayResult<ProfileData> {
        let mut state = self.lock()?;
        state.calls.get_profile += 1;

        let user = state
            .user(user_id)
            .ok_or_else(|| GatewayError::rejected(404, "User not found"))?;

        let (files_count, total_downloads) = state
            .files
            .iter()
            .filter(|f| f.user_id == user_id)
            .fold((0, 0), |(count, downloads), f| {
                (count + 1, downloads + f.downloads_count)
            });

        Ok(ProfileData {
            user_id: user.id,
            email: user.email.clone(),
            user_type: user.user_type,
            is_verified: user.is_verified,
            full_name: user.full_name.clone(),
            bio: user.bio.clone(),
            avatar_url: user.avatar_url.clone(),
            created_at: Some(user.created_at.clone()),
            stats: ProfileStats {
                files_count,
                total_downloads,
            },
        })
    }

    async fn update_profile(&self, update: ProfileUpdate) -> GatewayResult<MessageAck> {
        let mut state = self.lock()?;
        state.calls.update_profile += 1;

        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == update.user_id)
            .ok_or_else(|| GatewayError::rejected(404, "User not found"))?;
        user.full_name = update.full_name;
        user.bio = update.bio;
        user.avatar_url = update.avatar_url;

        Ok(MessageAck {
            message: Some("Profile updated".to_string()),
        })
    }
}

fn identity_of(row: &UserRow) -> Identity {
    Identity {
        user_id: row.id,
        email: row.email.clone(),
        user_type: row.user_type,
        is_verified: row.is_verified,
    }
}

fn timestamp() -> String {
    chrono::Utc::now()
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
