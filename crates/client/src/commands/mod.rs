//! IPC surface for a webview frontend.
//!
//! The request and error types here are plain serde types. The
//! `#[tauri::command]` handlers that use them are compiled with the
//! `desktop` feature.

#[cfg(feature = "desktop")]
pub mod handlers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use protocol::UserType;
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::ClientConfig;
use crate::controller::Controller;
use crate::error::ClientError;
use crate::logging;
use crate::view::{Action, Screen};

// ============================================================================
// Error Types
// ============================================================================

/// Serializable error returned to the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Message suitable for display.
    pub message: String,
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CommandError {}

/// Shown when a command fails without a more specific message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

impl CommandError {
    /// Build from a client error. Service rejections keep their message;
    /// transport, storage and I/O failures show `generic` instead of their
    /// detail.
    pub fn with_generic(e: ClientError, generic: &str) -> Self {
        let message = match &e {
            ClientError::Precondition(_) | ClientError::Config(_) => e.to_string(),
            _ => e.user_message(generic),
        };
        Self {
            code: e.code().to_string(),
            message,
        }
    }
}

impl From<ClientError> for CommandError {
    fn from(e: ClientError) -> Self {
        Self::with_generic(e, GENERIC_FAILURE_MESSAGE)
    }
}

/// Result type for IPC commands.
pub type CommandResult<T> = Result<T, CommandError>;

// ============================================================================
// Application State
// ============================================================================

/// State managed by the desktop shell.
pub struct AppState {
    controller: Arc<Controller>,
}

impl AppState {
    pub fn new(controller: Arc<Controller>) -> Self {
        Self { controller }
    }

    /// Build the controller from configuration.
    pub fn from_config(config: &ClientConfig) -> CommandResult<Self> {
        let controller = Controller::from_config(config)?;
        Ok(Self::new(Arc::new(controller)))
    }

    /// Desktop startup: resolve the configuration at `config_path` (the
    /// default path when `None`), install logging and build the state.
    ///
    /// The returned guard flushes the log file and must outlive the app.
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<(Self, Option<WorkerGuard>)> {
        let config = match config_path {
            Some(path) => ClientConfig::resolve(path)?,
            None => ClientConfig::load_default()?,
        };
        let guard = logging::init_from_config(&config.logging);
        tracing::info!("Starting VneFiles client against {}", config.service.files_url);

        let state = Self::from_config(&config).context("Failed to initialize client state")?;
        Ok((state, guard))
    }

    pub fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }

    /// Current screen with its enabled actions.
    pub fn snapshot(&self) -> ScreenResponse {
        ScreenResponse {
            screen: self.controller.screen(),
            actions: self.controller.available_actions(),
        }
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// What the frontend renders after every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenResponse {
    pub screen: Screen,
    pub actions: Vec<Action>,
}

/// Credentials for login.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration form.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub user_type: UserType,
    #[serde(default)]
    pub special_code: Option<String>,
}

/// File chosen for upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectFileRequest {
    pub path: PathBuf,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Edit buffer changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditDraftRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}
