//! Web API Authentication Tests
//!
//! Integration tests for registration, sessions and service status.

mod common;

use std::sync::Arc;

use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION, ORIGIN};
use axum::http::StatusCode;
use axum_test::TestServer;
use files_manager::web::{create_router, AppState};
use files_manager::{
    hash_password, Database, FileStorage, JobQueue, RedisStore, UserRepository, THUMBNAIL_QUEUE,
};
use serde_json::{json, Value};

use common::{basic_auth, create_test_server, login, register_user, token_value, x_token};

// ============================================================================
// Registration Tests
// ============================================================================

#[tokio::test]
async fn test_register_success() {
    let ctx = create_test_server().await;

    let response = ctx
        .server
        .post("/users")
        .json(&json!({ "email": "bob@dylan.com", "password": "toto1234!" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["email"], "bob@dylan.com");
    assert!(body["id"].as_i64().unwrap() > 0);
    assert!(body.get("password").is_none());

    let stored = UserRepository::new(ctx.db.pool())
        .get_by_email("bob@dylan.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.password, hash_password("toto1234!"));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let ctx = create_test_server().await;
    register_user(&ctx.server, "bob@dylan.com", "toto1234!").await;

    let response = ctx
        .server
        .post("/users")
        .json(&json!({ "email": "bob@dylan.com", "password": "other" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({ "error": "Already exist" }));
}

#[tokio::test]
async fn test_register_missing_fields() {
    let ctx = create_test_server().await;

    let response = ctx.server.post("/users").json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Missing email");

    let response = ctx
        .server
        .post("/users")
        .json(&json!({ "email": "a@b.c" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Missing password");
}

#[tokio::test]
async fn test_register_empty_body() {
    let ctx = create_test_server().await;

    let response = ctx.server.post("/users").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Missing email");
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_connect_and_me() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;

    let response = ctx
        .server
        .get("/users/me")
        .add_header(x_token(), token_value(&token))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["email"], "bob@dylan.com");
    assert!(body["id"].is_i64());
}

#[tokio::test]
async fn test_connect_stores_session() {
    use files_manager::KeyValueStore;

    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;

    let user_id = ctx.tokens.get(&format!("auth_{token}")).await.unwrap();
    assert!(user_id.is_some());
}

#[tokio::test]
async fn test_connect_wrong_password() {
    let ctx = create_test_server().await;
    register_user(&ctx.server, "bob@dylan.com", "toto1234!").await;

    let response = ctx
        .server
        .get("/connect")
        .add_header(AUTHORIZATION, basic_auth("bob@dylan.com", "wrong"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>(), json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn test_connect_without_header() {
    let ctx = create_test_server().await;

    let response = ctx.server.get("/connect").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_connect_malformed_header() {
    let ctx = create_test_server().await;
    register_user(&ctx.server, "bob@dylan.com", "toto1234!").await;

    let response = ctx
        .server
        .get("/connect")
        .add_header(AUTHORIZATION, "Bearer something")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_token() {
    let ctx = create_test_server().await;

    ctx.server
        .get("/users/me")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    ctx.server
        .get("/users/me")
        .add_header(x_token(), token_value("not-a-session"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_disconnect_revokes_token() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;

    let response = ctx
        .server
        .get("/disconnect")
        .add_header(x_token(), token_value(&token))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);
    assert!(response.as_bytes().is_empty());

    ctx.server
        .get("/users/me")
        .add_header(x_token(), token_value(&token))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    ctx.server
        .get("/disconnect")
        .add_header(x_token(), token_value(&token))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_each_connect_mints_a_new_token() {
    let ctx = create_test_server().await;
    let first = login(&ctx.server, "bob@dylan.com", "toto1234!").await;

    let second = ctx
        .server
        .get("/connect")
        .add_header(AUTHORIZATION, basic_auth("bob@dylan.com", "toto1234!"))
        .await
        .json::<Value>()["token"]
        .as_str()
        .unwrap()
        .to_string();

    assert_ne!(first, second);
    for token in [&first, &second] {
        ctx.server
            .get("/users/me")
            .add_header(x_token(), token_value(token))
            .await
            .assert_status_ok();
    }
}

#[tokio::test]
async fn test_token_store_down_is_internal_error() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;
    ctx.tokens.set_available(false);

    let response = ctx
        .server
        .get("/users/me")
        .add_header(x_token(), token_value(&token))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["error"], "Internal Server Error");
}

// ============================================================================
// Status Tests
// ============================================================================

#[tokio::test]
async fn test_status_ok() {
    let ctx = create_test_server().await;

    let response = ctx.server.get("/status").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "redis": true, "db": true }));
}

#[tokio::test]
async fn test_status_with_store_down() {
    let ctx = create_test_server().await;
    ctx.tokens.set_available(false);

    let response = ctx.server.get("/status").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>()["error"],
        "Either Redis or the database is not connected"
    );
}

#[tokio::test]
async fn test_status_starts_with_redis_down() {
    let dir = tempfile::TempDir::new().unwrap();
    let db = Database::open_in_memory().await.unwrap();
    let tokens = Arc::new(RedisStore::open("redis://127.0.0.1:1").unwrap());
    let queue = JobQueue::new(db.clone(), THUMBNAIL_QUEUE);
    let storage = FileStorage::new(dir.path().join("files_manager"));
    let state = AppState::new(db, tokens.clone(), storage, queue);
    let server = TestServer::new(create_router(Arc::new(state), &[])).unwrap();

    assert!(!tokens.ping().await);
    let response = server.get("/status").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>()["error"],
        "Either Redis or the database is not connected"
    );
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let ctx = create_test_server().await;

    let response = ctx
        .server
        .get("/status")
        .add_header(ORIGIN, "http://example.com")
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.header(ACCESS_CONTROL_ALLOW_ORIGIN).to_str().unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_stats_counts() {
    let ctx = create_test_server().await;

    let response = ctx.server.get("/stats").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "users": 0, "files": 0 }));

    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;
    common::upload(
        &ctx.server,
        &token,
        json!({ "name": "docs", "type": "folder" }),
    )
    .await;

    let response = ctx.server.get("/stats").await;
    assert_eq!(response.json::<Value>(), json!({ "users": 1, "files": 1 }));
}
