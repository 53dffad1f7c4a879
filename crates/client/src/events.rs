//! Events emitted by the controller for the UI.

use protocol::Identity;
use serde::{Deserialize, Serialize};

use crate::view::ViewState;

/// Buffer size for the event broadcast channel.
pub const EVENT_BUFFER_SIZE: usize = 64;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title, message)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, "Error", message)
    }

    fn new(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Events emitted by the controller for frontend notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientEvent {
    /// The view state changed.
    ViewChanged(ViewState),
    /// A session started or ended.
    SessionChanged(Option<Identity>),
    /// A new listing was applied.
    CatalogUpdated { count: usize },
    /// The displayed profile changed.
    ProfileUpdated { user_id: i64 },
    /// Something to toast.
    Notice(Notice),
}
