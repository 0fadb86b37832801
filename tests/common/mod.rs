//! Shared helpers for HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tempfile::TempDir;

use files_manager::web::{create_router, AppState};
use files_manager::{Database, FileStorage, JobQueue, MemoryStore, THUMBNAIL_QUEUE};

/// A router backed by an in-memory database, an in-memory token store and
/// a temporary storage directory.
pub struct TestContext {
    pub server: TestServer,
    pub db: Database,
    pub tokens: Arc<MemoryStore>,
    pub queue: JobQueue,
    pub storage: FileStorage,
    _dir: TempDir,
}

/// Create a test server.
pub async fn create_test_server() -> TestContext {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let tokens = Arc::new(MemoryStore::new());
    let queue = JobQueue::new(db.clone(), THUMBNAIL_QUEUE);
    let storage = FileStorage::new(dir.path().join("files_manager"));

    let app_state = AppState::new(db.clone(), tokens.clone(), storage.clone(), queue.clone());
    let router = create_router(Arc::new(app_state), &[]);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestContext {
        server,
        db,
        tokens,
        queue,
        storage,
        _dir: dir,
    }
}

/// `Authorization: Basic ...` value for a credential pair.
pub fn basic_auth(email: &str, password: &str) -> HeaderValue {
    let encoded = STANDARD.encode(format!("{email}:{password}"));
    HeaderValue::from_str(&format!("Basic {encoded}")).unwrap()
}

/// `X-Token` header name.
pub fn x_token() -> HeaderName {
    HeaderName::from_static("x-token")
}

/// Header value from a token string.
pub fn token_value(token: &str) -> HeaderValue {
    HeaderValue::from_str(token).unwrap()
}

/// Base64-encode a payload.
pub fn b64(data: impl AsRef<[u8]>) -> String {
    STANDARD.encode(data)
}

/// Register a user and return the response body.
pub async fn register_user(server: &TestServer, email: &str, password: &str) -> Value {
    server
        .post("/users")
        .json(&json!({ "email": email, "password": password }))
        .await
        .json::<Value>()
}

/// Register a user and connect, returning the session token.
pub async fn login(server: &TestServer, email: &str, password: &str) -> String {
    register_user(server, email, password).await;
    let response = server
        .get("/connect")
        .add_header(AUTHORIZATION, basic_auth(email, password))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["token"]
        .as_str()
        .expect("token missing")
        .to_string()
}

/// Upload through the API and return the response body.
pub async fn upload(server: &TestServer, token: &str, body: Value) -> Value {
    let response = server
        .post("/files")
        .add_header(x_token(), token_value(token))
        .json(&body)
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}
