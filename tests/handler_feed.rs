mod common;

use axum::http::StatusCode;
use serde_json::Value;
use shelf_social::domain::repositories::UserRepository;

#[tokio::test]
async fn test_feed_requires_authentication() {
    let app = common::spawn_app();

    app.server
        .get("/api/feed")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_feed_is_empty_without_follows() {
    let app = common::spawn_app();
    let (_, token) = common::create_test_user(&app.store, "alice", &[]).await;
    let (bob, _) = common::create_test_user(&app.store, "bob", &[]).await;
    common::create_test_post(&app.store, bob.id, "Unseen").await;

    let response = app.server.get("/api/feed").authorization_bearer(&token).await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["page"], 1);
    assert_eq!(json["page_size"], 10);
    assert_eq!(json["results"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_feed_shows_followed_posts_newest_first() {
    let app = common::spawn_app();
    let (alice, token) = common::create_test_user(&app.store, "alice", &[]).await;
    let (bob, _) = common::create_test_user(&app.store, "bob", &[]).await;
    let (carol, _) = common::create_test_user(&app.store, "carol", &[]).await;
    app.store.follow(alice.id, bob.id).await.unwrap();

    common::create_test_post(&app.store, bob.id, "Older").await;
    common::create_test_post(&app.store, carol.id, "Not followed").await;
    common::create_test_post(&app.store, bob.id, "Newer").await;
    common::create_test_post(&app.store, alice.id, "Own post").await;

    let response = app.server.get("/api/feed").authorization_bearer(&token).await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    let titles: Vec<&str> = json["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Newer", "Older"]);
}

#[tokio::test]
async fn test_feed_pagination() {
    let app = common::spawn_app();
    let (alice, token) = common::create_test_user(&app.store, "alice", &[]).await;
    let (bob, _) = common::create_test_user(&app.store, "bob", &[]).await;
    app.store.follow(alice.id, bob.id).await.unwrap();

    for i in 0..12 {
        common::create_test_post(&app.store, bob.id, &format!("Post {i}")).await;
    }

    let response = app
        .server
        .get("/api/feed")
        .authorization_bearer(&token)
        .add_query_param("page", 2)
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["page"], 2);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["title"], "Post 1");
    assert_eq!(results[1]["title"], "Post 0");

    let response = app
        .server
        .get("/api/feed")
        .authorization_bearer(&token)
        .add_query_param("page", 5)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["results"], serde_json::json!([]));
}

#[tokio::test]
async fn test_feed_rejects_bad_page() {
    let app = common::spawn_app();
    let (_, token) = common::create_test_user(&app.store, "alice", &[]).await;

    app.server
        .get("/api/feed")
        .authorization_bearer(&token)
        .add_query_param("page", "zero")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .get("/api/feed")
        .authorization_bearer(&token)
        .add_query_param("page", 0)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
