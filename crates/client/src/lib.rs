//! # VneFiles Client Library
//!
//! Client core for the VneFiles file-exchange service: session handling,
//! the shared file listing, uploads, downloads and profiles.
//!
//! ## Overview
//!
//! - **Session**: login, registration and a persisted identity
//! - **Catalog**: cached file listing and the pending upload
//! - **Profiles**: viewing and editing with stale-response protection
//! - **Controller**: the view state machine, action set and render model
//! - **Gateway**: HTTP access to the service, plus an in-process stand-in
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              Frontend (webview or any Rust caller)              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │           Controller  (view state, actions, screen())           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────┐   │
//! │  │ SessionStore │  │ FileCatalog  │  │     ProfilePane      │   │
//! │  └──────┬───────┘  └──────┬───────┘  └──────────┬───────────┘   │
//! │         │ SQLite          └──────────┬──────────┘               │
//! │         ▼                            ▼                          │
//! │  IdentityBackend               Gateway (HTTP)                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vnefiles_client::{Controller, InMemoryGateway, MemoryBackend, Screen, UserType, ViewState};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let controller = Controller::new(
//!     Arc::new(InMemoryGateway::new()),
//!     Arc::new(MemoryBackend::new()),
//! );
//! controller.start().await;
//! controller
//!     .register("a@x.com", "p1", UserType::Regular, None)
//!     .await
//!     .unwrap();
//!
//! assert_eq!(controller.view(), ViewState::Browsing);
//! assert!(matches!(controller.screen(), Screen::Browser(_)));
//! # }
//! ```
//!
//! ## Usage with Tauri
//!
//! With the `desktop` feature enabled:
//!
//! ```rust,ignore
//! use vnefiles_client::{commands::AppState, generate_handler};
//!
//! fn main() {
//!     // Reads the config file, applies VNEFILES_* overrides, validates and
//!     // installs logging.
//!     let (state, _log_guard) = AppState::load(None).expect("client state");
//!     tauri::Builder::default()
//!         .manage(state)
//!         .invoke_handler(generate_handler!())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! ## Modules
//!
//! - [`controller`]: the state machine
//! - [`session`], [`catalog`], [`profile`]: the state it coordinates
//! - [`gateway`]: service access
//! - [`storage`]: SQLite persistence
//! - [`view`], [`events`]: what the UI reads
//! - [`config`], [`logging`], [`error`]: ambient setup
//! - [`commands`]: IPC payloads and, with `desktop`, Tauri handlers

pub mod catalog;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod gateway;
pub mod logging;
pub mod profile;
pub mod session;
pub mod storage;
pub mod view;

pub use protocol;
pub use protocol::{FileRecord, Identity, ProfileData, ProfileStats, UserType};

pub use catalog::{FileCatalog, PendingUpload, UploadSource};
pub use commands::{AppState, CommandError, CommandResult};
pub use config::{ClientConfig, ConfigError};
pub use controller::Controller;
pub use error::{ClientError, ClientResult};
pub use events::{ClientEvent, Notice, NoticeLevel};
pub use gateway::{Gateway, GatewayError, HttpGateway, InMemoryGateway};
pub use profile::{LoadOutcome, ProfileDraft, ProfilePane, ProfileStatus, SaveOutcome};
pub use session::SessionStore;
pub use storage::{Database, IdentityBackend, MemoryBackend, SqliteBackend};
pub use view::{Action, Screen, ViewState};

/// Generate the Tauri command handler with all registered commands.
///
/// ```rust,ignore
/// tauri::Builder::default()
///     .invoke_handler(vnefiles_client::generate_handler!())
///     .run(tauri::generate_context!())
///     .expect("error while running tauri application");
/// ```
#[cfg(feature = "desktop")]
#[macro_export]
macro_rules! generate_handler {
    () => {
        tauri::generate_handler![
            $crate::commands::handlers::initialize_app,
            $crate::commands::handlers::get_screen,
            $crate::commands::handlers::select_register_type,
            $crate::commands::handlers::login,
            $crate::commands::handlers::register,
            $crate::commands::handlers::logout,
            $crate::commands::handlers::refresh_files,
            $crate::commands::handlers::select_upload_file,
            $crate::commands::handlers::clear_upload_selection,
            $crate::commands::handlers::upload_file,
            $crate::commands::handlers::download_file,
            $crate::commands::handlers::view_profile,
            $crate::commands::handlers::view_own_profile,
            $crate::commands::handlers::back_to_files,
            $crate::commands::handlers::enter_edit_mode,
            $crate::commands::handlers::edit_profile_draft,
            $crate::commands::handlers::cancel_edit,
            $crate::commands::handlers::save_profile,
        ]
    };
}
