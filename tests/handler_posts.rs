mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_anonymous_can_read_posts() {
    let app = common::spawn_app();
    let (alice, _) = common::create_test_user(&app.store, "alice", &[]).await;
    let post = common::create_test_post(&app.store, alice.id, "Hello").await;

    let response = app.server.get("/api/posts").await;
    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json.as_array().unwrap().len(), 1);

    let response = app.server.get(&format!("/api/posts/{}", post.id)).await;
    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["title"], "Hello");
    assert_eq!(json["author"], alice.id);
}

#[tokio::test]
async fn test_anonymous_cannot_create_post() {
    let app = common::spawn_app();

    let response = app
        .server
        .post("/api/posts")
        .json(&json!({ "title": "Hello", "content": "World" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_post_sets_author_from_caller() {
    let app = common::spawn_app();
    let (alice, token) = common::create_test_user(&app.store, "alice", &[]).await;
    let (bob, _) = common::create_test_user(&app.store, "bob", &[]).await;

    let response = app
        .server
        .post("/api/posts")
        .authorization_bearer(&token)
        .json(&json!({ "title": "Hello", "content": "World", "author": bob.id }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let json = response.json::<Value>();
    assert_eq!(json["author"], alice.id);
    assert!(json["created_at"].is_string());
    assert!(json["updated_at"].is_string());
}

#[tokio::test]
async fn test_only_owner_can_modify_post() {
    let app = common::spawn_app();
    let (alice, alice_token) = common::create_test_user(&app.store, "alice", &[]).await;
    let (_, bob_token) = common::create_test_user(&app.store, "bob", &[]).await;
    let post = common::create_test_post(&app.store, alice.id, "Hello").await;
    let path = format!("/api/posts/{}", post.id);

    let response = app
        .server
        .patch(&path)
        .authorization_bearer(&bob_token)
        .json(&json!({ "title": "Hijacked" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    app.server
        .delete(&path)
        .authorization_bearer(&bob_token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .patch(&path)
        .authorization_bearer(&alice_token)
        .json(&json!({ "title": "Edited" }))
        .await;
    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["title"], "Edited");
    assert_eq!(json["content"], "Hello content");
}

#[tokio::test]
async fn test_post_validation() {
    let app = common::spawn_app();
    let (_, token) = common::create_test_user(&app.store, "alice", &[]).await;

    let response = app
        .server
        .post("/api/posts")
        .authorization_bearer(&token)
        .json(&json!({ "title": "" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let json = response.json::<Value>();
    assert!(json["error"]["details"]["title"].is_array());
    assert_eq!(
        json["error"]["details"]["content"][0],
        "This field is required."
    );
}

#[tokio::test]
async fn test_posts_filter_by_author_and_search() {
    let app = common::spawn_app();
    let (alice, _) = common::create_test_user(&app.store, "alice", &[]).await;
    let (bob, _) = common::create_test_user(&app.store, "bob", &[]).await;
    common::create_test_post(&app.store, alice.id, "Rust notes").await;
    common::create_test_post(&app.store, bob.id, "Gardening").await;

    let response = app
        .server
        .get("/api/posts")
        .add_query_param("author", bob.id)
        .await;
    let json = response.json::<Value>();
    let posts = json.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["title"], "Gardening");

    let response = app
        .server
        .get("/api/posts")
        .add_query_param("search", "rust")
        .await;
    let json = response.json::<Value>();
    let posts = json.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["title"], "Rust notes");
}

#[tokio::test]
async fn test_posts_newest_first() {
    let app = common::spawn_app();
    let (alice, _) = common::create_test_user(&app.store, "alice", &[]).await;
    common::create_test_post(&app.store, alice.id, "First").await;
    common::create_test_post(&app.store, alice.id, "Second").await;

    let response = app.server.get("/api/posts").await;
    let json = response.json::<Value>();
    let titles: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Second", "First"]);
}

#[tokio::test]
async fn test_comment_on_post_and_cascade_delete() {
    let app = common::spawn_app();
    let (alice, alice_token) = common::create_test_user(&app.store, "alice", &[]).await;
    let (_, bob_token) = common::create_test_user(&app.store, "bob", &[]).await;
    let post = common::create_test_post(&app.store, alice.id, "Hello").await;

    let response = app
        .server
        .post("/api/comments")
        .authorization_bearer(&bob_token)
        .json(&json!({ "post": post.id, "content": "Nice post" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let comment = response.json::<Value>();
    assert_eq!(comment["post"], post.id);

    let response = app
        .server
        .get("/api/comments")
        .add_query_param("post", post.id)
        .await;
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 1);

    app.server
        .delete(&format!("/api/posts/{}", post.id))
        .authorization_bearer(&alice_token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.server
        .get(&format!("/api/comments/{}", comment["id"]))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_comment_on_missing_post() {
    let app = common::spawn_app();
    let (_, token) = common::create_test_user(&app.store, "alice", &[]).await;

    let response = app
        .server
        .post("/api/comments")
        .authorization_bearer(&token)
        .json(&json!({ "post": 999, "content": "Hello?" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let json = response.json::<Value>();
    assert!(json["error"]["details"]["post"].is_array());
}

#[tokio::test]
async fn test_only_comment_owner_can_edit() {
    let app = common::spawn_app();
    let (alice, alice_token) = common::create_test_user(&app.store, "alice", &[]).await;
    let (bob, bob_token) = common::create_test_user(&app.store, "bob", &[]).await;
    let post = common::create_test_post(&app.store, alice.id, "Hello").await;
    let comment = common::create_test_comment(&app.store, post.id, bob.id, "First!").await;
    let path = format!("/api/comments/{}", comment.id);

    app.server
        .patch(&path)
        .authorization_bearer(&alice_token)
        .json(&json!({ "content": "Edited by alice" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .patch(&path)
        .authorization_bearer(&bob_token)
        .json(&json!({ "content": "Edited" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["content"], "Edited");
}
