//! Error types for the client core.

use thiserror::Error;

use crate::config::ConfigError;
use crate::gateway::GatewayError;
use crate::storage::{BackendError, DatabaseError};
use crate::view::Action;

/// Errors returned by client operations.
///
/// No variant is fatal: after any of them the controller is back in the view
/// it was in before the failed operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service refused the request. The message is shown as is.
    #[error("{0}")]
    Rejected(String),

    /// The request failed in transit or the response did not decode.
    #[error("transport error: {0}")]
    Transport(String),

    /// The action is not available in the current state.
    #[error("action {0:?} is not available")]
    Precondition(Action),

    /// Local persistence failed.
    #[error("storage error: {0}")]
    Storage(#[from] BackendError),

    /// Reading a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Message to show the user, falling back to `generic` for failures the
    /// service did not explain.
    pub fn user_message(&self, generic: &str) -> String {
        match self {
            ClientError::Rejected(message) => message.clone(),
            _ => generic.to_string(),
        }
    }

    /// Stable code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Rejected(_) => "REJECTED",
            ClientError::Transport(_) => "TRANSPORT_ERROR",
            ClientError::Precondition(_) => "NOT_AVAILABLE",
            ClientError::Storage(_) => "STORAGE_ERROR",
            ClientError::Io(_) => "IO_ERROR",
            ClientError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<GatewayError> for ClientError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Rejected { message, .. } => ClientError::Rejected(message),
            GatewayError::Transport(detail) => ClientError::Transport(detail),
            GatewayError::Malformed(detail) => {
                ClientError::Transport(format!("malformed response: {}", detail))
            }
        }
    }
}

impl From<DatabaseError> for ClientError {
    fn from(e: DatabaseError) -> Self {
        ClientError::Storage(BackendError::Database(e))
    }
}
