//! HTTP gateway against a local axum server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use vnefiles_client::config::ServiceConfig;
use vnefiles_client::gateway::{Gateway, GatewayError, HttpGateway};
use vnefiles_client::protocol::{AuthRequest, ProfileUpdate, UploadRequest, UserType};

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Recorded {
    fn push(&self, route: &str, body: Value) {
        self.bodies.lock().unwrap().push((route.to_string(), body));
    }

    fn last(&self, route: &str) -> Value {
        self.bodies
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(r, _)| r == route)
            .map(|(_, body)| body.clone())
            .expect("route should have been called")
    }
}

async fn auth(State(rec): State<Recorded>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    rec.push("auth", body.clone());
    if body["password"] == "wrong" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid email or password"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "user_id": 1,
            "email": body["email"],
            "user_type": body.get("user_type").cloned().unwrap_or(json!("regular")),
            "is_verified": null
        })),
    )
}

async fn list_files() -> Json<Value> {
    Json(json!({
        "files": [{
            "id": 2,
            "filename": "b.txt",
            "file_url": "https://storage.vnefiles.cloud/u2_b.txt",
            "file_size": 2048,
            "mime_type": "text/plain",
            "downloads_count": 3,
            "created_at": "2024-05-01T10:00:00",
            "uploader_id": 1,
            "uploader_email": "a@x.com",
            "uploader_type": "special",
            "uploader_verified": true
        }, {
            "id": 1,
            "filename": "a.txt",
            "file_url": "https://storage.vnefiles.cloud/u1_a.txt",
            "file_size": 10,
            "mime_type": "text/plain",
            "downloads_count": 0,
            "created_at": null,
            "uploader_id": 1,
            "uploader_email": "a@x.com",
            "uploader_type": "special",
            "uploader_verified": null
        }]
    }))
}

async fn record_download(
    State(rec): State<Recorded>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    rec.push("download", body.clone());
    if body["file_id"] == 1 {
        (
            StatusCode::OK,
            Json(json!({"file_url": "https://storage.vnefiles.cloud/u1_a.txt"})),
        )
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"error": "File not found"})))
    }
}

async fn upload(State(rec): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    rec.push("upload", body);
    Json(json!({
        "file_id": 5,
        "file_url": "https://storage.vnefiles.cloud/u5_report.pdf",
        "message": "File uploaded to cloud storage"
    }))
}

async fn get_profile(
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, (StatusCode, &'static str)> {
    match query.get("user_id").map(String::as_str) {
        Some("3") => Ok(Json(json!({
            "user_id": 3,
            "email": "c@x.com",
            "user_type": "regular",
            "is_verified": false,
            "full_name": "Cee",
            "bio": null,
            "avatar_url": null,
            "created_at": "2024-01-01T00:00:00",
            "stats": {"files_count": 0, "total_downloads": 0}
        }))),
        _ => Err((StatusCode::INTERNAL_SERVER_ERROR, "boom")),
    }
}

async fn update_profile(State(rec): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    rec.push("profile", body);
    Json(json!({"message": "Profile updated"}))
}

async fn broken() -> &'static str {
    "definitely not json"
}

async fn spawn_service() -> (HttpGateway, Recorded, String) {
    let rec = Recorded::default();
    let app = Router::new()
        .route("/auth", post(auth))
        .route("/files", get(list_files).post(record_download))
        .route("/upload", post(upload))
        .route("/profile", get(get_profile).post(update_profile))
        .route("/broken", get(broken))
        .with_state(rec.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base = format!("http://{}", addr);
    let gateway = HttpGateway::new(ServiceConfig::with_base_url(&base)).unwrap();
    (gateway, rec, base)
}

#[tokio::test]
async fn test_authenticate_sends_register_shape() {
    let (gateway, rec, _) = spawn_service().await;

    let identity = gateway
        .authenticate(AuthRequest::register(
            "a@x.com",
            "p1",
            UserType::Special,
            Some("669".to_string()),
        ))
        .await
        .unwrap();
    assert_eq!(identity.email, "a@x.com");
    assert_eq!(identity.user_type, UserType::Special);
    assert!(!identity.is_verified);

    assert_eq!(
        rec.last("auth"),
        json!({
            "action": "register",
            "email": "a@x.com",
            "password": "p1",
            "user_type": "special",
            "special_code": "669"
        })
    );
}

#[tokio::test]
async fn test_login_omits_register_fields() {
    let (gateway, rec, _) = spawn_service().await;

    gateway
        .authenticate(AuthRequest::login("a@x.com", "p1"))
        .await
        .unwrap();
    assert_eq!(
        rec.last("auth"),
        json!({"action": "login", "email": "a@x.com", "password": "p1"})
    );
}

#[tokio::test]
async fn test_error_body_is_passed_through() {
    let (gateway, _, _) = spawn_service().await;

    let err = gateway
        .authenticate(AuthRequest::login("a@x.com", "wrong"))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::rejected(401, "Invalid email or password"));
}

#[tokio::test]
async fn test_list_files_preserves_order() {
    let (gateway, _, _) = spawn_service().await;

    let files = gateway.list_files().await.unwrap();
    let ids: Vec<_> = files.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(files[0].display_size(), "2.0 KB");
    assert!(!files[1].uploader_verified);
    assert!(files[1].created_at.is_none());
}

#[tokio::test]
async fn test_record_download_shape() {
    let (gateway, rec, _) = spawn_service().await;

    let ack = gateway.record_download(1).await.unwrap();
    assert_eq!(
        ack.file_url.as_deref(),
        Some("https://storage.vnefiles.cloud/u1_a.txt")
    );
    assert_eq!(rec.last("download"), json!({"action": "download", "file_id": 1}));

    let err = gateway.record_download(9).await.unwrap_err();
    assert_eq!(err, GatewayError::rejected(404, "File not found"));
}

#[tokio::test]
async fn test_upload_shape() {
    let (gateway, rec, _) = spawn_service().await;

    let receipt = gateway
        .upload_file(UploadRequest {
            user_id: 1,
            filename: "report.pdf".to_string(),
            file_content: "aGVsbG8=".to_string(),
            mime_type: "application/pdf".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(receipt.file_id, Some(5));
    assert_eq!(receipt.message, "File uploaded to cloud storage");
    assert_eq!(
        rec.last("upload"),
        json!({
            "user_id": 1,
            "filename": "report.pdf",
            "file_content": "aGVsbG8=",
            "mime_type": "application/pdf"
        })
    );
}

#[tokio::test]
async fn test_profile_read_and_write() {
    let (gateway, rec, _) = spawn_service().await;

    let profile = gateway.get_profile(3).await.unwrap();
    assert_eq!(profile.full_name.as_deref(), Some("Cee"));

    let ack = gateway
        .update_profile(ProfileUpdate {
            user_id: 3,
            full_name: Some("Cee".to_string()),
            bio: None,
            avatar_url: None,
        })
        .await
        .unwrap();
    assert_eq!(ack.message.as_deref(), Some("Profile updated"));
    assert_eq!(
        rec.last("profile"),
        json!({"user_id": 3, "full_name": "Cee", "bio": null, "avatar_url": null})
    );
}

#[tokio::test]
async fn test_status_without_error_body_is_transport() {
    let (gateway, _, _) = spawn_service().await;

    let err = gateway.get_profile(4).await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
}

#[tokio::test]
async fn test_undecodable_success_is_malformed() {
    let (_, _, base) = spawn_service().await;
    let mut service = ServiceConfig::with_base_url(&base);
    service.files_url = format!("{}/broken", base);
    let gateway = HttpGateway::new(service).unwrap();

    let err = gateway.list_files().await.unwrap_err();
    assert!(matches!(err, GatewayError::Malformed(_)));
}
