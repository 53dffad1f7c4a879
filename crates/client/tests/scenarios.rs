//! End-to-end client scenarios against the in-process service.

use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::broadcast;
use vnefiles_client::gateway::DEFAULT_SPECIAL_CODE;
use vnefiles_client::storage::IDENTITY_KEY;
use vnefiles_client::{
    Action, ClientError, ClientEvent, Controller, Database, IdentityBackend, InMemoryGateway,
    MemoryBackend, NoticeLevel, PendingUpload, Screen, SqliteBackend, UserType, ViewState,
};

fn in_memory() -> (Arc<InMemoryGateway>, Arc<MemoryBackend>, Controller) {
    let gateway = Arc::new(InMemoryGateway::new());
    let backend = Arc::new(MemoryBackend::new());
    let controller = Controller::new(gateway.clone(), backend.clone());
    (gateway, backend, controller)
}

async fn register_special(controller: &Controller, email: &str) {
    controller
        .register(email, "p1", UserType::Special, Some(DEFAULT_SPECIAL_CODE.to_string()))
        .await
        .expect("special registration should succeed");
}

fn drain(events: &mut broadcast::Receiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn browser(controller: &Controller) -> vnefiles_client::view::BrowserScreen {
    match controller.screen() {
        Screen::Browser(screen) => screen,
        other => panic!("expected browser screen, got {:?}", other),
    }
}

fn profile(controller: &Controller) -> vnefiles_client::view::ProfileScreen {
    match controller.screen() {
        Screen::Profile(screen) => screen,
        other => panic!("expected profile screen, got {:?}", other),
    }
}

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn test_special_user_uploads_report() {
    let (gateway, _, controller) = in_memory();
    controller.start().await;

    let identity = controller
        .register("a@x.com", "p1", UserType::Special, Some("669".to_string()))
        .await
        .unwrap();
    assert_eq!(identity.user_id, 1);
    assert_eq!(identity.email, "a@x.com");
    assert_eq!(identity.user_type, UserType::Special);
    assert!(controller.files().is_empty());

    controller
        .select_file(PendingUpload::from_bytes(
            "report.pdf",
            Some("application/pdf".to_string()),
            b"%PDF-1.4 quarterly numbers".to_vec(),
        ))
        .unwrap();
    assert!(controller.is_available(Action::Upload));

    let mut events = controller.subscribe();
    let receipt = controller.upload().await.unwrap();
    assert_eq!(receipt.message, "File uploaded to cloud storage");

    let files = controller.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].filename, "report.pdf");
    assert_eq!(files[0].uploader_email, "a@x.com");
    assert_eq!(files[0].mime_type, "application/pdf");
    assert!(controller.pending_upload().is_none());
    assert!(!controller.is_available(Action::Upload));
    assert_eq!(gateway.calls().upload_file, 1);

    let events = drain(&mut events);
    assert!(events.contains(&ClientEvent::CatalogUpdated { count: 1 }));
    assert!(events.iter().any(|e| matches!(
        e,
        ClientEvent::Notice(n) if n.level == NoticeLevel::Success
            && n.message == "File uploaded to cloud storage"
    )));
}

#[tokio::test]
async fn test_upload_from_disk() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"meeting notes").unwrap();

    let (_, _, controller) = in_memory();
    register_special(&controller, "a@x.com").await;

    let upload = PendingUpload::from_path(&path, None).await.unwrap();
    controller.select_file(upload).unwrap();
    controller.upload().await.unwrap();

    let files = controller.files();
    assert_eq!(files[0].filename, "notes.txt");
    assert_eq!(files[0].file_size, 13);
    assert_eq!(files[0].mime_type, "application/octet-stream");
}

#[tokio::test]
async fn test_missing_file_keeps_selection() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("vanishing.txt");
    std::fs::write(&path, b"here for now").unwrap();

    let (gateway, _, controller) = in_memory();
    register_special(&controller, "a@x.com").await;
    controller
        .select_file(PendingUpload::from_path(&path, None).await.unwrap())
        .unwrap();
    std::fs::remove_file(&path).unwrap();

    let mut events = controller.subscribe();
    let err = controller.upload().await.unwrap_err();
    assert!(matches!(err, ClientError::Io(_)));
    assert_eq!(gateway.calls().upload_file, 0);
    assert_eq!(
        controller.pending_upload().map(|p| p.name),
        Some("vanishing.txt".to_string())
    );

    let notices: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            ClientEvent::Notice(n) if n.level == NoticeLevel::Error => Some(n.message),
            _ => None,
        })
        .collect();
    assert_eq!(notices, vec!["Could not read the file".to_string()]);
}

#[tokio::test]
async fn test_regular_user_cannot_reach_upload() {
    let (gateway, _, controller) = in_memory();
    controller
        .register("r@x.com", "pw", UserType::Regular, None)
        .await
        .unwrap();

    let actions = controller.available_actions();
    assert!(!actions.contains(&Action::Upload));
    assert!(!actions.contains(&Action::SelectFile));
    assert!(browser(&controller).upload_panel.is_none());

    let err = controller
        .select_file(PendingUpload::from_bytes("a.txt", None, b"x".to_vec()))
        .unwrap_err();
    assert!(matches!(err, ClientError::Precondition(Action::SelectFile)));

    let err = controller.upload().await.unwrap_err();
    assert!(matches!(err, ClientError::Precondition(Action::Upload)));
    assert_eq!(gateway.calls().upload_file, 0);
}

#[tokio::test]
async fn test_upload_panel_shows_pending_file() {
    let (_, _, controller) = in_memory();
    register_special(&controller, "a@x.com").await;

    let panel = browser(&controller).upload_panel.expect("special users see the panel");
    assert!(panel.pending_name.is_none());
    assert!(!panel.upload_enabled);

    controller
        .select_file(PendingUpload::from_bytes("big.bin", None, vec![0; 1536]))
        .unwrap();
    let panel = browser(&controller).upload_panel.unwrap();
    assert_eq!(panel.pending_name.as_deref(), Some("big.bin"));
    assert_eq!(panel.pending_size.as_deref(), Some("1.5 KB"));
    assert!(panel.upload_enabled);

    controller.clear_selection();
    assert!(!browser(&controller).upload_panel.unwrap().upload_enabled);
}

// ============================================================================
// Listing and downloads
// ============================================================================

#[tokio::test]
async fn test_empty_listing_shows_empty_state() {
    let (_, _, controller) = in_memory();
    controller.start().await;
    controller
        .register("r@x.com", "pw", UserType::Regular, None)
        .await
        .unwrap();

    let screen = browser(&controller);
    assert_eq!(screen.file_count, 0);
    assert!(screen.files.is_empty());
    assert_eq!(screen.empty_state.as_deref(), Some("No files uploaded yet"));
}

#[tokio::test]
async fn test_download_twice_counts_twice() {
    let (gateway, _, controller) = in_memory();
    register_special(&controller, "a@x.com").await;
    controller
        .select_file(PendingUpload::from_bytes("a.txt", None, b"abc".to_vec()))
        .unwrap();
    let file_id = controller.upload().await.unwrap().file_id.unwrap();

    let ack = controller.download(file_id, "a.txt").await.unwrap();
    assert!(ack.file_url.unwrap().ends_with("_a.txt"));
    controller.download(file_id, "a.txt").await.unwrap();

    assert_eq!(controller.files()[0].downloads_count, 2);
    assert_eq!(gateway.calls().record_download, 2);

    let screen = browser(&controller);
    assert_eq!(screen.file_count, 1);
    assert!(screen.empty_state.is_none());
}

#[tokio::test]
async fn test_failed_download_emits_error_notice() {
    let (_, _, controller) = in_memory();
    register_special(&controller, "a@x.com").await;
    let mut events = controller.subscribe();

    let err = controller.download(77, "ghost.txt").await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected(_)));
    assert_eq!(controller.view(), ViewState::Browsing);

    let events = drain(&mut events);
    assert!(events.iter().any(|e| matches!(
        e,
        ClientEvent::Notice(n) if n.level == NoticeLevel::Error && n.message == "File not found"
    )));
}

// ============================================================================
// Session
// ============================================================================

#[tokio::test]
async fn test_login_then_logout_clears_persisted_identity() {
    let (_, backend, controller) = in_memory();
    controller
        .register("r@x.com", "pw", UserType::Regular, None)
        .await
        .unwrap();
    controller.logout();

    controller.login("r@x.com", "pw").await.unwrap();
    assert_eq!(controller.view(), ViewState::Browsing);
    assert!(backend.load().unwrap().is_some());

    controller.logout();
    assert_eq!(controller.view(), ViewState::Unauthenticated);
    assert!(controller.identity().is_none());
    assert_eq!(backend.load().unwrap(), None);
    assert!(matches!(controller.screen(), Screen::Auth(_)));
}

#[tokio::test]
async fn test_logout_keeps_catalog_and_drops_selection() {
    let (_, _, controller) = in_memory();
    register_special(&controller, "a@x.com").await;
    controller
        .select_file(PendingUpload::from_bytes("a.txt", None, b"abc".to_vec()))
        .unwrap();
    controller.upload().await.unwrap();
    controller
        .select_file(PendingUpload::from_bytes("b.txt", None, b"def".to_vec()))
        .unwrap();

    controller.logout();
    assert_eq!(controller.files().len(), 1);
    assert!(controller.pending_upload().is_none());
}

#[tokio::test]
async fn test_session_survives_restart() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = dir.path().join("client.db");
    let gateway = Arc::new(InMemoryGateway::new());

    {
        let db = Database::open(&db_path).expect("Failed to open database");
        let controller = Controller::new(gateway.clone(), Arc::new(SqliteBackend::new(db)));
        register_special(&controller, "a@x.com").await;
    }

    let db = Database::open(&db_path).expect("Failed to reopen database");
    assert!(db.get_value(IDENTITY_KEY).unwrap().is_some());
    let controller = Controller::new(gateway.clone(), Arc::new(SqliteBackend::new(db)));
    let mut events = controller.subscribe();
    controller.start().await;

    assert_eq!(controller.view(), ViewState::Browsing);
    assert_eq!(controller.identity().map(|i| i.email), Some("a@x.com".to_string()));
    assert_eq!(gateway.calls().authenticate, 1);

    let events = drain(&mut events);
    assert!(events.contains(&ClientEvent::ViewChanged(ViewState::Browsing)));
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected_verbatim() {
    let (_, _, controller) = in_memory();
    register_special(&controller, "a@x.com").await;
    controller.logout();

    let err = controller
        .register("a@x.com", "p2", UserType::Regular, None)
        .await
        .unwrap_err();
    assert_eq!(err.user_message("Registration failed"), "Email already registered");
    assert_eq!(controller.view(), ViewState::Unauthenticated);
}

// ============================================================================
// Profiles
// ============================================================================

#[tokio::test]
async fn test_edit_controls_only_on_own_profile() {
    let (_, _, controller) = in_memory();
    controller
        .register("b@x.com", "pw", UserType::Regular, None)
        .await
        .unwrap();
    controller.logout();
    register_special(&controller, "a@x.com").await;
    let me = controller.identity().unwrap();

    controller.view_profile(1).await.unwrap();
    let screen = profile(&controller);
    assert_eq!(screen.profile.as_ref().map(|p| p.email.as_str()), Some("b@x.com"));
    assert!(!screen.editable);
    assert!(!controller.is_available(Action::EditProfile));
    assert!(matches!(
        controller.enter_edit_mode(),
        Err(ClientError::Precondition(Action::EditProfile))
    ));

    controller.view_profile(me.user_id).await.unwrap();
    assert!(profile(&controller).editable);
    assert!(controller.is_available(Action::EditProfile));
}

#[tokio::test]
async fn test_save_profile_round_trip() {
    let (gateway, _, controller) = in_memory();
    register_special(&controller, "a@x.com").await;

    controller.view_own_profile().await.unwrap();
    controller.enter_edit_mode().unwrap();
    assert!(controller.is_available(Action::SaveProfile));
    controller
        .edit_draft(Some("Ann Example".to_string()), Some("   ".to_string()))
        .unwrap();

    controller.save_profile().await.unwrap();

    let screen = profile(&controller);
    assert!(!screen.editing);
    let data = screen.profile.unwrap();
    assert_eq!(data.full_name.as_deref(), Some("Ann Example"));
    assert_eq!(data.bio, None);
    assert_eq!(gateway.calls().update_profile, 1);
    assert_eq!(gateway.calls().get_profile, 2);
}

#[tokio::test]
async fn test_cancel_edit_discards_changes() {
    let (gateway, _, controller) = in_memory();
    register_special(&controller, "a@x.com").await;
    controller.view_own_profile().await.unwrap();
    controller.enter_edit_mode().unwrap();
    controller
        .edit_draft(Some("Changed".to_string()), None)
        .unwrap();

    controller.cancel_edit().unwrap();

    let screen = profile(&controller);
    assert!(!screen.editing);
    assert_eq!(screen.draft.full_name, "");
    assert_eq!(gateway.calls().update_profile, 0);
}

#[tokio::test]
async fn test_profile_stats_reflect_activity() {
    let (_, _, controller) = in_memory();
    register_special(&controller, "a@x.com").await;
    controller
        .select_file(PendingUpload::from_bytes("a.txt", None, b"abc".to_vec()))
        .unwrap();
    let file_id = controller.upload().await.unwrap().file_id.unwrap();
    controller.download(file_id, "a.txt").await.unwrap();

    controller.view_own_profile().await.unwrap();
    let stats = profile(&controller).profile.unwrap().stats;
    assert_eq!(stats.files_count, 1);
    assert_eq!(stats.total_downloads, 1);

    controller.back_to_files().unwrap();
    assert_eq!(controller.view(), ViewState::Browsing);
}
