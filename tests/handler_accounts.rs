mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};
use shelf_social::server::seed_admin;

#[tokio::test]
async fn test_profile_requires_authentication() {
    let app = common::spawn_app();

    app.server
        .get("/api/accounts/profile")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_hides_password_hash() {
    let app = common::spawn_app();
    let (alice, token) = common::create_test_user(&app.store, "alice", &[]).await;

    let response = app
        .server
        .get("/api/accounts/profile")
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["id"], alice.id);
    assert_eq!(json["username"], "alice");
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn test_update_profile() {
    let app = common::spawn_app();
    let (_, token) = common::create_test_user(&app.store, "alice", &[]).await;

    let response = app
        .server
        .patch("/api/accounts/profile")
        .authorization_bearer(&token)
        .json(&json!({ "bio": "Reads a lot." }))
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["bio"], "Reads a lot.");
    assert_eq!(json["email"], "alice@example.com");

    let response = app
        .server
        .patch("/api/accounts/profile")
        .authorization_bearer(&token)
        .json(&json!({ "email": "not-an-email" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"]["details"]["email"].is_array());
}

#[tokio::test]
async fn test_follow_and_unfollow() {
    let app = common::spawn_app();
    let (_, token) = common::create_test_user(&app.store, "alice", &[]).await;
    let (bob, _) = common::create_test_user(&app.store, "bob", &[]).await;

    let response = app
        .server
        .post(&format!("/api/accounts/follow/{}", bob.id))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["message"],
        "You are now following bob."
    );

    let profile = app
        .server
        .get("/api/accounts/profile")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(profile["following"], json!([bob.id]));

    let response = app
        .server
        .post(&format!("/api/accounts/unfollow/{}", bob.id))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["message"], "You unfollowed bob.");

    let profile = app
        .server
        .get("/api/accounts/profile")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(profile["following"], json!([]));
}

#[tokio::test]
async fn test_cannot_follow_self() {
    let app = common::spawn_app();
    let (alice, token) = common::create_test_user(&app.store, "alice", &[]).await;

    let response = app
        .server
        .post(&format!("/api/accounts/follow/{}", alice.id))
        .authorization_bearer(&token)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["code"],
        "invalid_operation"
    );
}

#[tokio::test]
async fn test_follow_unknown_user() {
    let app = common::spawn_app();
    let (_, token) = common::create_test_user(&app.store, "alice", &[]).await;

    app.server
        .post("/api/accounts/follow/999")
        .authorization_bearer(&token)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_follow_requires_authentication() {
    let app = common::spawn_app();
    let (bob, _) = common::create_test_user(&app.store, "bob", &[]).await;

    app.server
        .post(&format!("/api/accounts/follow/{}", bob.id))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_follow_non_numeric_id_uses_error_envelope() {
    let app = common::spawn_app();
    let (_, token) = common::create_test_user(&app.store, "alice", &[]).await;

    let response = app
        .server
        .post("/api/accounts/follow/bob")
        .authorization_bearer(&token)
        .await;

    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_bootstrap_admin_can_write() {
    let app = common::spawn_app();
    seed_admin(&app.store, common::TEST_SECRET, "bootstrap-token-123")
        .await
        .unwrap();

    let response = app
        .server
        .get("/api/accounts/profile")
        .authorization_bearer("bootstrap-token-123")
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["username"], "admin");

    app.server
        .post("/api/authors")
        .authorization_bearer("bootstrap-token-123")
        .json(&json!({ "name": "Author One" }))
        .await
        .assert_status(StatusCode::CREATED);
}
