//! View controller tying session, catalog and profile together.
//!
//! The controller is shared behind an `Arc`. Its locks are short and
//! synchronous and are never held across an `.await`, so a second action can
//! start while a first is still waiting on the service.

use std::sync::{Arc, PoisonError, RwLock};

use protocol::{DownloadAck, FileRecord, Identity, UploadReceipt, UserType};
use tokio::sync::broadcast;

use crate::catalog::{FileCatalog, PendingUpload};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::events::{ClientEvent, Notice, EVENT_BUFFER_SIZE};
use crate::gateway::{Gateway, HttpGateway};
use crate::profile::{LoadOutcome, ProfilePane, ProfileStatus};
use crate::session::SessionStore;
use crate::storage::{Database, IdentityBackend, SqliteBackend};
use crate::view::{
    Action, AuthScreen, BrowserScreen, ProfileScreen, Screen, UploadPanel, ViewState,
    EMPTY_LISTING_MESSAGE,
};

/// The client's state machine.
pub struct Controller {
    session: SessionStore,
    catalog: FileCatalog,
    profile: ProfilePane,
    view: RwLock<ViewState>,
    register_user_type: RwLock<UserType>,
    event_tx: broadcast::Sender<ClientEvent>,
}

impl Controller {
    /// Create a controller over the given gateway and identity backend.
    pub fn new(gateway: Arc<dyn Gateway>, backend: Arc<dyn IdentityBackend>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self {
            session: SessionStore::new(gateway.clone(), backend),
            catalog: FileCatalog::new(gateway.clone()),
            profile: ProfilePane::new(gateway),
            view: RwLock::new(ViewState::Unauthenticated),
            register_user_type: RwLock::new(UserType::Regular),
            event_tx,
        }
    }

    /// Create a controller that talks HTTP and persists to the configured
    /// SQLite database. The configuration is validated first.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let gateway = HttpGateway::new(config.service.clone())?;
        let db_path = config.storage.database_path();
        tracing::info!("Opening client database at {:?}", db_path);
        let db = Database::open(&db_path)?;
        Ok(Self::new(Arc::new(gateway), Arc::new(SqliteBackend::new(db))))
    }

    /// Subscribes to controller events.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: ClientEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    fn notify(&self, notice: Notice) {
        self.emit(ClientEvent::Notice(notice));
    }

    fn fail(&self, err: &ClientError, generic: &str) {
        self.notify(Notice::error(err.user_message(generic)));
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn view(&self) -> ViewState {
        *self.view.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_view(&self, view: ViewState) {
        {
            let mut current = self.view.write().unwrap_or_else(PoisonError::into_inner);
            if *current == view {
                return;
            }
            tracing::debug!("View {:?} -> {:?}", *current, view);
            *current = view;
        }
        self.emit(ClientEvent::ViewChanged(view));
    }

    pub fn identity(&self) -> Option<Identity> {
        self.session.current()
    }

    pub fn files(&self) -> Vec<FileRecord> {
        (*self.catalog.files()).clone()
    }

    pub fn pending_upload(&self) -> Option<PendingUpload> {
        self.catalog.pending()
    }

    /// Restore the session, pick the first view and load the listing.
    ///
    /// A failed listing is logged and leaves the catalog empty.
    pub async fn start(&self) {
        let identity = self.session.restore();
        let view = if identity.is_some() {
            ViewState::Browsing
        } else {
            ViewState::Unauthenticated
        };
        self.emit(ClientEvent::SessionChanged(identity));
        self.set_view(view);

        if let Err(e) = self.reload_catalog().await {
            tracing::warn!("Initial file listing failed: {}", e);
        }
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Actions enabled in the current state.
    pub fn available_actions(&self) -> Vec<Action> {
        let identity = match self.session.current() {
            Some(identity) => identity,
            None => return vec![Action::Login, Action::Register],
        };

        let mut actions = vec![Action::Logout, Action::ViewProfile];
        match self.view() {
            ViewState::Unauthenticated => {}
            ViewState::Browsing => {
                actions.extend([Action::RefreshFiles, Action::Download]);
                if identity.can_upload() {
                    actions.push(Action::SelectFile);
                    if self.catalog.pending().is_some() {
                        actions.push(Action::Upload);
                    }
                }
            }
            ViewState::ViewingProfile(_) => {
                actions.push(Action::BackToFiles);
                if self.profile.is_editing() {
                    actions.extend([Action::EditDraft, Action::SaveProfile, Action::CancelEdit]);
                } else if self.profile.is_editable_by(&identity) {
                    actions.push(Action::EditProfile);
                }
            }
        }
        actions
    }

    pub fn is_available(&self, action: Action) -> bool {
        self.available_actions().contains(&action)
    }

    fn require(&self, action: Action) -> ClientResult<()> {
        if self.is_available(action) {
            Ok(())
        } else {
            tracing::debug!("Rejected unavailable action {:?} in {:?}", action, self.view());
            Err(ClientError::Precondition(action))
        }
    }

    fn require_identity(&self, action: Action) -> ClientResult<Identity> {
        self.require(action)?;
        self.session
            .current()
            .ok_or(ClientError::Precondition(action))
    }

    /// Choose the account type in the registration form.
    pub fn select_register_type(&self, user_type: UserType) {
        *self
            .register_user_type
            .write()
            .unwrap_or_else(PoisonError::into_inner) = user_type;
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Identity> {
        self.require(Action::Login)?;
        match self.session.login(email, password).await {
            Ok(identity) => {
                self.enter_session(&identity);
                self.notify(Notice::success(
                    "Signed in",
                    format!("Welcome, {}!", identity.email),
                ));
                Ok(identity)
            }
            Err(e) => {
                self.fail(&e, "Login failed");
                Err(e)
            }
        }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        user_type: UserType,
        special_code: Option<String>,
    ) -> ClientResult<Identity> {
        self.require(Action::Register)?;
        match self
            .session
            .register(email, password, user_type, special_code)
            .await
        {
            Ok(identity) => {
                self.enter_session(&identity);
                self.notify(Notice::success(
                    "Registration successful",
                    format!("Account created: {}", identity.email),
                ));
                Ok(identity)
            }
            Err(e) => {
                self.fail(&e, "Registration failed");
                Err(e)
            }
        }
    }

    fn enter_session(&self, identity: &Identity) {
        self.emit(ClientEvent::SessionChanged(Some(identity.clone())));
        self.set_view(ViewState::Browsing);
    }

    /// End the session from any state.
    pub fn logout(&self) {
        let previous = self.session.logout();
        self.profile.reset();
        self.catalog.clear_selection();
        self.emit(ClientEvent::SessionChanged(None));
        self.set_view(ViewState::Unauthenticated);
        if previous.is_some() {
            self.notify(Notice::info("Signed out", "You have signed out"));
        }
    }

    /// Reload the shared listing.
    pub async fn refresh_files(&self) -> ClientResult<usize> {
        self.require(Action::RefreshFiles)?;
        self.reload_catalog().await
    }

    async fn reload_catalog(&self) -> ClientResult<usize> {
        if self.catalog.refresh().await? {
            self.announce_catalog();
        }
        Ok(self.catalog.len())
    }

    fn announce_catalog(&self) {
        self.emit(ClientEvent::CatalogUpdated {
            count: self.catalog.len(),
        });
    }

    /// Choose a file for upload.
    pub fn select_file(&self, upload: PendingUpload) -> ClientResult<()> {
        self.require(Action::SelectFile)?;
        self.catalog.select_file(upload);
        Ok(())
    }

    pub fn clear_selection(&self) {
        self.catalog.clear_selection();
    }

    /// Upload the selected file.
    pub async fn upload(&self) -> ClientResult<UploadReceipt> {
        let identity = self.require_identity(Action::Upload)?;
        self.notify(Notice::info("Uploading...", "Sending the file to the cloud"));

        match self.catalog.upload(&identity).await {
            Ok(receipt) => {
                self.announce_catalog();
                self.notify(Notice::success("File uploaded", receipt.message.clone()));
                Ok(receipt)
            }
            Err(e) => {
                match &e {
                    ClientError::Io(_) => self.notify(Notice::error("Could not read the file")),
                    _ => self.fail(&e, "Upload failed"),
                }
                Err(e)
            }
        }
    }

    /// Record a download of `file_id`. The returned URL is handed to the
    /// platform to fetch the bytes.
    pub async fn download(&self, file_id: i64, filename: &str) -> ClientResult<DownloadAck> {
        self.require(Action::Download)?;

        match self.catalog.download(file_id).await {
            Ok(ack) => {
                self.announce_catalog();
                self.notify(Notice::info(
                    "Downloading",
                    format!("Downloading {}...", filename),
                ));
                Ok(ack)
            }
            Err(e) => {
                self.fail(&e, "Download failed");
                Err(e)
            }
        }
    }

    /// Navigate to a user's profile and load it.
    pub async fn view_profile(&self, user_id: i64) -> ClientResult<()> {
        self.require(Action::ViewProfile)?;
        self.set_view(ViewState::ViewingProfile(user_id));

        match self.profile.load(user_id).await {
            Ok(LoadOutcome::Applied(_)) => {
                self.emit(ClientEvent::ProfileUpdated { user_id });
                Ok(())
            }
            Ok(LoadOutcome::Discarded) => Ok(()),
            Err(e) => {
                self.fail(&e, "Could not load profile");
                Err(e)
            }
        }
    }

    /// Navigate to the signed-in user's own profile.
    pub async fn view_own_profile(&self) -> ClientResult<()> {
        let identity = self.require_identity(Action::ViewProfile)?;
        self.view_profile(identity.user_id).await
    }

    pub fn back_to_files(&self) -> ClientResult<()> {
        self.require(Action::BackToFiles)?;
        self.profile.reset();
        self.set_view(ViewState::Browsing);
        Ok(())
    }

    pub fn enter_edit_mode(&self) -> ClientResult<()> {
        let identity = self.require_identity(Action::EditProfile)?;
        self.profile.enter_edit_mode(&identity)
    }

    pub fn cancel_edit(&self) -> ClientResult<()> {
        self.require(Action::CancelEdit)?;
        self.profile.cancel_edit()
    }

    pub fn edit_draft(&self, full_name: Option<String>, bio: Option<String>) -> ClientResult<()> {
        self.require(Action::EditDraft)?;
        self.profile.edit_draft(full_name, bio)
    }

    /// Save the edit buffer and reload the profile.
    pub async fn save_profile(&self) -> ClientResult<()> {
        let identity = self.require_identity(Action::SaveProfile)?;

        match self.profile.save(&identity).await {
            Ok(outcome) => {
                if outcome.resynced {
                    self.emit(ClientEvent::ProfileUpdated {
                        user_id: identity.user_id,
                    });
                }
                self.notify(Notice::success(
                    "Profile saved",
                    outcome
                        .message
                        .unwrap_or_else(|| "Profile updated".to_string()),
                ));
                Ok(())
            }
            Err(e) => {
                self.fail(&e, "Could not save profile");
                Err(e)
            }
        }
    }

    // ========================================================================
    // Render Model
    // ========================================================================

    /// Snapshot of the current screen.
    pub fn screen(&self) -> Screen {
        let identity = match self.session.current() {
            Some(identity) => identity,
            None => {
                let user_type = *self
                    .register_user_type
                    .read()
                    .unwrap_or_else(PoisonError::into_inner);
                return Screen::Auth(AuthScreen::for_user_type(user_type));
            }
        };

        match self.view() {
            ViewState::Unauthenticated | ViewState::Browsing => {
                Screen::Browser(self.browser_screen(identity))
            }
            ViewState::ViewingProfile(user_id) => {
                let snapshot = self.profile.snapshot();
                let editable = snapshot.status == ProfileStatus::Loaded
                    && snapshot
                        .profile
                        .as_ref()
                        .is_some_and(|p| identity.owns_profile(p.user_id));
                Screen::Profile(ProfileScreen {
                    user_id,
                    status: snapshot.status,
                    profile: snapshot.profile,
                    editable,
                    editing: snapshot.editing,
                    draft: snapshot.draft,
                })
            }
        }
    }

    fn browser_screen(&self, identity: Identity) -> BrowserScreen {
        let files = self.files();
        let upload_panel = identity.can_upload().then(|| {
            let pending = self.catalog.pending();
            UploadPanel {
                pending_name: pending.as_ref().map(|p| p.name.clone()),
                pending_size: pending.as_ref().map(PendingUpload::display_size),
                upload_enabled: pending.is_some(),
            }
        });

        BrowserScreen {
            file_count: files.len(),
            empty_state: files
                .is_empty()
                .then(|| EMPTY_LISTING_MESSAGE.to_string()),
            files,
            identity,
            upload_panel,
        }
    }
}
