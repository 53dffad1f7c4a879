//! `#[tauri::command]` handlers over the controller.
//!
//! Every handler returns the fresh [`ScreenResponse`] so the frontend can
//! re-render without a second round trip.

use protocol::{DownloadAck, UserType};
use tauri::Emitter;
use tokio::sync::broadcast::error::RecvError;

use super::{
    AppState, CommandError, CommandResult, EditDraftRequest, LoginRequest, RegisterRequest, ScreenResponse,
    SelectFileRequest,
};
use crate::catalog::PendingUpload;
use crate::controller::Controller;

/// Name of the frontend event carrying [`crate::ClientEvent`]s.
pub const CLIENT_EVENT: &str = "client-event";

/// Forward controller events to the webview until the controller is gone.
pub fn forward_events(app: tauri::AppHandle, controller: &Controller) {
    let mut events = controller.subscribe();

    tauri::async_runtime::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(e) = app.emit(CLIENT_EVENT, &event) {
                        tracing::warn!("Failed to emit client event: {}", e);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Frontend lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

// ============================================================================
// Session Commands
// ============================================================================

/// Restore the session and load the listing.
#[tauri::command]
pub async fn initialize_app(state: tauri::State<'_, AppState>) -> CommandResult<ScreenResponse> {
    state.controller().start().await;
    Ok(state.snapshot())
}

#[tauri::command]
pub fn get_screen(state: tauri::State<'_, AppState>) -> ScreenResponse {
    state.snapshot()
}

#[tauri::command]
pub fn select_register_type(
    state: tauri::State<'_, AppState>,
    user_type: UserType,
) -> ScreenResponse {
    state.controller().select_register_type(user_type);
    state.snapshot()
}

#[tauri::command]
pub async fn login(
    state: tauri::State<'_, AppState>,
    request: LoginRequest,
) -> CommandResult<ScreenResponse> {
    state
        .controller()
        .login(&request.email, &request.password)
        .await
        .map_err(|e| CommandError::with_generic(e, "Login failed"))?;
    Ok(state.snapshot())
}

#[tauri::command]
pub async fn register(
    state: tauri::State<'_, AppState>,
    request: RegisterRequest,
) -> CommandResult<ScreenResponse> {
    state
        .controller()
        .register(
            &request.email,
            &request.password,
            request.user_type,
            request.special_code,
        )
        .await
        .map_err(|e| CommandError::with_generic(e, "Registration failed"))?;
    Ok(state.snapshot())
}

#[tauri::command]
pub fn logout(state: tauri::State<'_, AppState>) -> ScreenResponse {
    state.controller().logout();
    state.snapshot()
}

// ============================================================================
// File Commands
// ============================================================================

#[tauri::command]
pub async fn refresh_files(state: tauri::State<'_, AppState>) -> CommandResult<ScreenResponse> {
    state
        .controller()
        .refresh_files()
        .await
        .map_err(|e| CommandError::with_generic(e, "Could not load files"))?;
    Ok(state.snapshot())
}

#[tauri::command]
pub async fn select_upload_file(
    state: tauri::State<'_, AppState>,
    request: SelectFileRequest,
) -> CommandResult<ScreenResponse> {
    let upload = PendingUpload::from_path(&request.path, request.mime_type)
        .await
        .map_err(|e| CommandError::with_generic(e, "Could not read the file"))?;
    state.controller().select_file(upload)?;
    Ok(state.snapshot())
}

#[tauri::command]
pub fn clear_upload_selection(state: tauri::State<'_, AppState>) -> ScreenResponse {
    state.controller().clear_selection();
    state.snapshot()
}

#[tauri::command]
pub async fn upload_file(state: tauri::State<'_, AppState>) -> CommandResult<ScreenResponse> {
    state
        .controller()
        .upload()
        .await
        .map_err(|e| CommandError::with_generic(e, "Upload failed"))?;
    Ok(state.snapshot())
}

/// Record the download and return the URL the shell should open.
#[tauri::command]
pub async fn download_file(
    state: tauri::State<'_, AppState>,
    file_id: i64,
    filename: String,
) -> CommandResult<DownloadAck> {
    state
        .controller()
        .download(file_id, &filename)
        .await
        .map_err(|e| CommandError::with_generic(e, "Download failed"))
}

// ============================================================================
// Profile Commands
// ============================================================================

#[tauri::command]
pub async fn view_profile(
    state: tauri::State<'_, AppState>,
    user_id: i64,
) -> CommandResult<ScreenResponse> {
    state
        .controller()
        .view_profile(user_id)
        .await
        .map_err(|e| CommandError::with_generic(e, "Could not load profile"))?;
    Ok(state.snapshot())
}

#[tauri::command]
pub async fn view_own_profile(state: tauri::State<'_, AppState>) -> CommandResult<ScreenResponse> {
    state
        .controller()
        .view_own_profile()
        .await
        .map_err(|e| CommandError::with_generic(e, "Could not load profile"))?;
    Ok(state.snapshot())
}

#[tauri::command]
pub fn back_to_files(state: tauri::State<'_, AppState>) -> CommandResult<ScreenResponse> {
    state.controller().back_to_files()?;
    Ok(state.snapshot())
}

#[tauri::command]
pub fn enter_edit_mode(state: tauri::State<'_, AppState>) -> CommandResult<ScreenResponse> {
    state.controller().enter_edit_mode()?;
    Ok(state.snapshot())
}

#[tauri::command]
pub fn edit_profile_draft(
    state: tauri::State<'_, AppState>,
    request: EditDraftRequest,
) -> CommandResult<ScreenResponse> {
    state
        .controller()
        .edit_draft(request.full_name, request.bio)?;
    Ok(state.snapshot())
}

#[tauri::command]
pub fn cancel_edit(state: tauri::State<'_, AppState>) -> CommandResult<ScreenResponse> {
    state.controller().cancel_edit()?;
    Ok(state.snapshot())
}

#[tauri::command]
pub async fn save_profile(state: tauri::State<'_, AppState>) -> CommandResult<ScreenResponse> {
    state
        .controller()
        .save_profile()
        .await
        .map_err(|e| CommandError::with_generic(e, "Could not save profile"))?;
    Ok(state.snapshot())
}
