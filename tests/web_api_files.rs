//! Web API File Tests
//!
//! Integration tests for uploads, listings, publishing and content reads.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{b64, create_test_server, login, token_value, upload, x_token, TestContext};

async fn upload_error(ctx: &TestContext, token: &str, body: Value) -> String {
    let response = ctx
        .server
        .post("/files")
        .add_header(x_token(), token_value(token))
        .json(&body)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .to_string()
}

// ============================================================================
// Upload Tests
// ============================================================================

#[tokio::test]
async fn test_upload_requires_token() {
    let ctx = create_test_server().await;

    let response = ctx
        .server
        .post("/files")
        .json(&json!({ "name": "docs", "type": "folder" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>(), json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn test_upload_folder_without_data() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;

    let body = upload(&ctx.server, &token, json!({ "name": "docs", "type": "folder" })).await;

    assert_eq!(body["name"], "docs");
    assert_eq!(body["type"], "folder");
    assert_eq!(body["isPublic"], false);
    assert_eq!(body["parentId"], 0);
    assert!(body["userId"].as_i64().unwrap() > 0);
    assert!(body.get("localPath").is_none());
}

#[tokio::test]
async fn test_upload_file_writes_bytes() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;

    let body = upload(
        &ctx.server,
        &token,
        json!({
            "name": "hello.txt",
            "type": "file",
            "data": b64("Hello Webstack!\n"),
            "isPublic": true
        }),
    )
    .await;

    assert_eq!(body["type"], "file");
    assert_eq!(body["isPublic"], true);

    let mut entries = std::fs::read_dir(ctx.storage.base_path()).unwrap();
    let stored = entries.next().unwrap().unwrap().path();
    assert_eq!(std::fs::read(stored).unwrap(), b"Hello Webstack!\n");
}

#[tokio::test]
async fn test_upload_validation_order() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;

    assert_eq!(upload_error(&ctx, &token, json!({})).await, "Missing name");
    assert_eq!(
        upload_error(&ctx, &token, json!({ "name": "a" })).await,
        "Missing type"
    );
    assert_eq!(
        upload_error(&ctx, &token, json!({ "name": "a", "type": "video" })).await,
        "Missing type"
    );
    assert_eq!(
        upload_error(&ctx, &token, json!({ "name": "a", "type": "file" })).await,
        "Missing data"
    );
    assert_eq!(
        upload_error(&ctx, &token, json!({ "name": "a", "type": "image", "data": "" })).await,
        "Missing data"
    );
}

#[tokio::test]
async fn test_upload_parent_checks() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;
    let file = upload(
        &ctx.server,
        &token,
        json!({ "name": "a.txt", "type": "file", "data": b64("a") }),
    )
    .await;

    assert_eq!(
        upload_error(&ctx, &token, json!({ "name": "b", "type": "folder", "parentId": 999 })).await,
        "Parent not found"
    );
    let bad_parent = json!({ "name": "b", "type": "folder", "parentId": "abc" });
    assert_eq!(upload_error(&ctx, &token, bad_parent).await, "Parent not found");
    assert_eq!(
        upload_error(
            &ctx,
            &token,
            json!({ "name": "b", "type": "folder", "parentId": file["id"] })
        )
        .await,
        "Parent is not a folder"
    );
}

#[tokio::test]
async fn test_upload_into_folder() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;
    let folder = upload(&ctx.server, &token, json!({ "name": "docs", "type": "folder" })).await;

    let by_number = upload(
        &ctx.server,
        &token,
        json!({ "name": "a.txt", "type": "file", "data": b64("a"), "parentId": folder["id"] }),
    )
    .await;
    let by_string = upload(
        &ctx.server,
        &token,
        json!({
            "name": "b.txt",
            "type": "file",
            "data": b64("b"),
            "parentId": folder["id"].as_i64().unwrap().to_string()
        }),
    )
    .await;

    assert_eq!(by_number["parentId"], folder["id"]);
    assert_eq!(by_string["parentId"], folder["id"]);
}

#[tokio::test]
async fn test_upload_invalid_base64() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;

    assert_eq!(
        upload_error(&ctx, &token, json!({ "name": "a", "type": "file", "data": "!!!" })).await,
        "Invalid data"
    );
}

#[tokio::test]
async fn test_upload_invalid_json() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;

    let response = ctx
        .server
        .post("/files")
        .add_header(x_token(), token_value(&token))
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_image_upload_queues_thumbnail_job() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;

    upload(
        &ctx.server,
        &token,
        json!({ "name": "notes.txt", "type": "file", "data": b64("x") }),
    )
    .await;
    assert_eq!(ctx.queue.counts().await.unwrap().waiting, 0);

    upload(
        &ctx.server,
        &token,
        json!({ "name": "pic.png", "type": "image", "data": b64("not really a png") }),
    )
    .await;
    assert_eq!(ctx.queue.counts().await.unwrap().waiting, 1);
}

// ============================================================================
// Read Tests
// ============================================================================

#[tokio::test]
async fn test_get_file() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;
    let folder = upload(&ctx.server, &token, json!({ "name": "docs", "type": "folder" })).await;

    let response = ctx
        .server
        .get(&format!("/files/{}", folder["id"]))
        .add_header(x_token(), token_value(&token))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), folder);
}

#[tokio::test]
async fn test_get_file_not_found() {
    let ctx = create_test_server().await;
    let owner = login(&ctx.server, "bob@dylan.com", "toto1234!").await;
    let other = login(&ctx.server, "ann@example.com", "secret").await;
    let folder = upload(&ctx.server, &owner, json!({ "name": "docs", "type": "folder" })).await;

    for path in [
        format!("/files/{}", folder["id"]),
        "/files/999".to_string(),
        "/files/abc".to_string(),
        "/files/0".to_string(),
    ] {
        let response = ctx
            .server
            .get(&path)
            .add_header(x_token(), token_value(&other))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>(), json!({ "error": "Not found" }));
    }
}

#[tokio::test]
async fn test_list_files_pagination() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;
    for i in 0..25 {
        upload(
            &ctx.server,
            &token,
            json!({ "name": format!("f{i}"), "type": "folder" }),
        )
        .await;
    }

    let first = ctx
        .server
        .get("/files")
        .add_header(x_token(), token_value(&token))
        .await
        .json::<Vec<Value>>();
    assert_eq!(first.len(), 20);
    assert_eq!(first[0]["name"], "f0");

    let second = ctx
        .server
        .get("/files")
        .add_query_param("parentId", 0)
        .add_query_param("page", 1)
        .add_header(x_token(), token_value(&token))
        .await
        .json::<Vec<Value>>();
    assert_eq!(second.len(), 5);
    assert_eq!(second[0]["name"], "f20");

    let beyond = ctx
        .server
        .get("/files")
        .add_query_param("page", 5)
        .add_header(x_token(), token_value(&token))
        .await
        .json::<Vec<Value>>();
    assert!(beyond.is_empty());
}

#[tokio::test]
async fn test_list_files_by_parent() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;
    let other = login(&ctx.server, "ann@example.com", "secret").await;
    let folder = upload(&ctx.server, &token, json!({ "name": "docs", "type": "folder" })).await;
    upload(
        &ctx.server,
        &token,
        json!({ "name": "a.txt", "type": "file", "data": b64("a"), "parentId": folder["id"] }),
    )
    .await;
    upload(&ctx.server, &other, json!({ "name": "theirs", "type": "folder" })).await;

    let children = ctx
        .server
        .get("/files")
        .add_query_param("parentId", folder["id"].as_i64().unwrap())
        .add_header(x_token(), token_value(&token))
        .await
        .json::<Vec<Value>>();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0]["name"], "a.txt");

    let root = ctx
        .server
        .get("/files")
        .add_query_param("parentId", 0)
        .add_header(x_token(), token_value(&token))
        .await
        .json::<Vec<Value>>();
    assert_eq!(root.len(), 1);
    assert_eq!(root[0]["name"], "docs");

    let nonsense = ctx
        .server
        .get("/files")
        .add_query_param("parentId", "abc")
        .add_header(x_token(), token_value(&token))
        .await;
    nonsense.assert_status_ok();
    assert!(nonsense.json::<Vec<Value>>().is_empty());
}

// ============================================================================
// Publish Tests
// ============================================================================

#[tokio::test]
async fn test_publish_and_unpublish() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;
    let file = upload(
        &ctx.server,
        &token,
        json!({ "name": "hello.txt", "type": "file", "data": b64("hello") }),
    )
    .await;
    let data_path = format!("/files/{}/data", file["id"]);

    ctx.server
        .get(&data_path)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = ctx
        .server
        .put(&format!("/files/{}/publish", file["id"]))
        .add_header(x_token(), token_value(&token))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["isPublic"], true);

    let anonymous = ctx.server.get(&data_path).await;
    anonymous.assert_status_ok();
    assert_eq!(anonymous.text(), "hello");

    let response = ctx
        .server
        .put(&format!("/files/{}/unpublish", file["id"]))
        .add_header(x_token(), token_value(&token))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["isPublic"], false);

    ctx.server
        .get(&data_path)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_publish_foreign_file() {
    let ctx = create_test_server().await;
    let owner = login(&ctx.server, "bob@dylan.com", "toto1234!").await;
    let other = login(&ctx.server, "ann@example.com", "secret").await;
    let folder = upload(&ctx.server, &owner, json!({ "name": "docs", "type": "folder" })).await;

    ctx.server
        .put(&format!("/files/{}/publish", folder["id"]))
        .add_header(x_token(), token_value(&other))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    ctx.server
        .put(&format!("/files/{}/publish", folder["id"]))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Content Tests
// ============================================================================

#[tokio::test]
async fn test_file_data_owner_and_content_type() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;
    let file = upload(
        &ctx.server,
        &token,
        json!({ "name": "hello.txt", "type": "file", "data": b64("Hello Webstack!\n") }),
    )
    .await;

    let response = ctx
        .server
        .get(&format!("/files/{}/data", file["id"]))
        .add_header(x_token(), token_value(&token))
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), "Hello Webstack!\n");
    assert_eq!(
        response.header("content-type").to_str().unwrap(),
        "text/plain; charset=utf-8"
    );
}

#[tokio::test]
async fn test_file_data_private_to_others() {
    let ctx = create_test_server().await;
    let owner = login(&ctx.server, "bob@dylan.com", "toto1234!").await;
    let other = login(&ctx.server, "ann@example.com", "secret").await;
    let file = upload(
        &ctx.server,
        &owner,
        json!({ "name": "secret.txt", "type": "file", "data": b64("s") }),
    )
    .await;

    let response = ctx
        .server
        .get(&format!("/files/{}/data", file["id"]))
        .add_header(x_token(), token_value(&other))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>(), json!({ "error": "Not found" }));
}

#[tokio::test]
async fn test_file_data_for_folder() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;
    let folder = upload(&ctx.server, &token, json!({ "name": "docs", "type": "folder" })).await;

    let response = ctx
        .server
        .get(&format!("/files/{}/data", folder["id"]))
        .add_header(x_token(), token_value(&token))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "A folder doesn't have content" })
    );
}

#[tokio::test]
async fn test_file_data_size_variant() {
    let ctx = create_test_server().await;
    let token = login(&ctx.server, "bob@dylan.com", "toto1234!").await;
    let image = upload(
        &ctx.server,
        &token,
        json!({ "name": "pic.png", "type": "image", "data": b64("original"), "isPublic": true }),
    )
    .await;
    let data_path = format!("/files/{}/data", image["id"]);

    ctx.server
        .get(&data_path)
        .add_query_param("size", 250)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let mut entries = std::fs::read_dir(ctx.storage.base_path()).unwrap();
    let original = entries.next().unwrap().unwrap().path();
    let mut thumb = original.clone().into_os_string();
    thumb.push("_250");
    std::fs::write(&thumb, b"small").unwrap();

    let response = ctx.server.get(&data_path).add_query_param("size", 250).await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"small");
    assert_eq!(response.header("content-type").to_str().unwrap(), "image/png");

    ctx.server
        .get(&data_path)
        .add_query_param("size", "../x")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
