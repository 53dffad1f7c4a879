//! Profile viewer and editor.
//!
//! Every [`ProfilePane::load`] takes a fresh generation token. Responses are
//! applied only while their token is still the pane's current one, so the
//! profile on screen is always the one navigated to last. Entering or
//! leaving edit mode starts a new edit session, and a save only closes the
//! editor it was started from.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use protocol::{Identity, ProfileData, ProfileUpdate};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::gateway::Gateway;
use crate::view::Action;

/// Loading state of the profile pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Edit buffer for the editable profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub full_name: String,
    pub bio: String,
}

impl ProfileDraft {
    /// Seed the buffer from a loaded profile.
    pub fn from_profile(profile: &ProfileData) -> Self {
        Self {
            full_name: profile.full_name.clone().unwrap_or_default(),
            bio: profile.bio.clone().unwrap_or_default(),
        }
    }

    /// Build the update sent to the service. Blank fields become `null`;
    /// the avatar is always cleared.
    pub fn to_update(&self, user_id: i64) -> ProfileUpdate {
        ProfileUpdate {
            user_id,
            full_name: non_blank(&self.full_name),
            bio: non_blank(&self.bio),
            avatar_url: None,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// What happened to a load once its response arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The profile is now displayed.
    Applied(ProfileData),
    /// Another navigation happened first; the response was dropped.
    Discarded,
}

/// Result of a save the service accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// The service's acknowledgement message.
    pub message: Option<String>,
    /// Whether the re-fetched profile replaced the displayed one.
    pub resynced: bool,
}

/// Point-in-time copy of the pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSnapshot {
    pub user_id: Option<i64>,
    pub status: ProfileStatus,
    pub profile: Option<ProfileData>,
    pub editing: bool,
    pub draft: ProfileDraft,
}

struct PaneState {
    token: u64,
    edit_session: u64,
    user_id: Option<i64>,
    status: ProfileStatus,
    profile: Option<ProfileData>,
    editing: bool,
    draft: ProfileDraft,
}

impl PaneState {
    fn idle(token: u64) -> Self {
        Self {
            token,
            edit_session: 0,
            user_id: None,
            status: ProfileStatus::Idle,
            profile: None,
            editing: false,
            draft: ProfileDraft::default(),
        }
    }

    fn owned_by(&self, viewer: &Identity) -> bool {
        self.status == ProfileStatus::Loaded
            && self
                .profile
                .as_ref()
                .is_some_and(|p| viewer.owns_profile(p.user_id))
    }

    fn show(&mut self, profile: ProfileData) {
        self.draft = ProfileDraft::from_profile(&profile);
        self.profile = Some(profile);
        self.status = ProfileStatus::Loaded;
        self.editing = false;
    }
}

/// The profile currently displayed, with its edit mode.
pub struct ProfilePane {
    gateway: Arc<dyn Gateway>,
    generation: AtomicU64,
    state: RwLock<PaneState>,
}

impl ProfilePane {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            generation: AtomicU64::new(0),
            state: RwLock::new(PaneState::idle(0)),
        }
    }

    pub fn snapshot(&self) -> ProfileSnapshot {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        ProfileSnapshot {
            user_id: state.user_id,
            status: state.status,
            profile: state.profile.clone(),
            editing: state.editing,
            draft: state.draft.clone(),
        }
    }

    /// Whether `viewer` may edit the loaded profile.
    pub fn is_editable_by(&self, viewer: &Identity) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .owned_by(viewer)
    }

    pub fn is_editing(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .editing
    }

    /// Forget the displayed profile and drop any response still in flight.
    pub fn reset(&self) {
        let token = self.next_token();
        *self.write() = PaneState::idle(token);
    }

    /// Fetch and display the profile of `user_id`.
    ///
    /// The pane shows the loading state until the response arrives. A
    /// failure is returned only if this load is still current.
    pub async fn load(&self, user_id: i64) -> ClientResult<LoadOutcome> {
        let token = self.next_token();
        {
            let mut state = self.write();
            *state = PaneState::idle(token);
            state.user_id = Some(user_id);
            state.status = ProfileStatus::Loading;
        }
        tracing::debug!("Loading profile {} (generation {})", user_id, token);

        let result = self.gateway.get_profile(user_id).await;

        let mut state = self.write();
        if state.token != token {
            tracing::debug!("Discarding profile {} from generation {}", user_id, token);
            return Ok(LoadOutcome::Discarded);
        }
        match result {
            Ok(profile) => {
                state.show(profile.clone());
                Ok(LoadOutcome::Applied(profile))
            }
            Err(e) => {
                tracing::warn!("Failed to load profile {}: {}", user_id, e);
                state.status = ProfileStatus::Failed;
                Err(e.into())
            }
        }
    }

    /// Start editing the loaded profile.
    pub fn enter_edit_mode(&self, viewer: &Identity) -> ClientResult<()> {
        let mut state = self.write();
        if !state.owned_by(viewer) || state.editing {
            return Err(ClientError::Precondition(Action::EditProfile));
        }
        state.editing = true;
        state.edit_session += 1;
        state.draft = state
            .profile
            .as_ref()
            .map(ProfileDraft::from_profile)
            .unwrap_or_default();
        Ok(())
    }

    /// Leave edit mode and discard the buffer.
    pub fn cancel_edit(&self) -> ClientResult<()> {
        let mut state = self.write();
        if !state.editing {
            return Err(ClientError::Precondition(Action::CancelEdit));
        }
        state.editing = false;
        state.edit_session += 1;
        state.draft = state
            .profile
            .as_ref()
            .map(ProfileDraft::from_profile)
            .unwrap_or_default();
        Ok(())
    }

    /// Change the buffer. `None` leaves a field as it is.
    pub fn edit_draft(&self, full_name: Option<String>, bio: Option<String>) -> ClientResult<()> {
        let mut state = self.write();
        if !state.editing {
            return Err(ClientError::Precondition(Action::EditDraft));
        }
        if let Some(full_name) = full_name {
            state.draft.full_name = full_name;
        }
        if let Some(bio) = bio {
            state.draft.bio = bio;
        }
        Ok(())
    }

    /// Send the buffer, re-fetch the profile and leave edit mode.
    ///
    /// On failure the pane stays in edit mode with the buffer intact. The
    /// re-fetch is applied only if the same profile is still displayed. If
    /// the editor was cancelled or reopened meanwhile, the fresh profile is
    /// shown but the current edit session and its buffer are left alone.
    pub async fn save(&self, viewer: &Identity) -> ClientResult<SaveOutcome> {
        let (token, session, update) = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            let user_id = match (&state.profile, state.editing && state.owned_by(viewer)) {
                (Some(profile), true) => profile.user_id,
                _ => return Err(ClientError::Precondition(Action::SaveProfile)),
            };
            (state.token, state.edit_session, state.draft.to_update(user_id))
        };
        let user_id = update.user_id;
        tracing::info!("Saving profile {}", user_id);

        let ack = self.gateway.update_profile(update).await.map_err(|e| {
            tracing::warn!("Failed to save profile {}: {}", user_id, e);
            ClientError::from(e)
        })?;

        let refreshed = self.gateway.get_profile(user_id).await;

        let mut state = self.write();
        if state.token != token {
            tracing::debug!("Profile {} no longer displayed, skipping resync", user_id);
            return Ok(SaveOutcome {
                message: ack.message,
                resynced: false,
            });
        }
        let same_session = state.edit_session == session;
        let resynced = match refreshed {
            Ok(profile) if same_session => {
                state.show(profile);
                true
            }
            Ok(profile) => {
                tracing::debug!("Edit session changed while saving profile {}", user_id);
                if !state.editing {
                    state.draft = ProfileDraft::from_profile(&profile);
                }
                state.profile = Some(profile);
                true
            }
            Err(e) => {
                tracing::warn!("Profile {} saved but resync failed: {}", user_id, e);
                if same_session {
                    state.editing = false;
                }
                false
            }
        };
        Ok(SaveOutcome {
            message: ack.message,
            resynced,
        })
    }

    fn next_token(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn write(&self) -> RwLockWriteGuard<'_, PaneState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
