#![allow(dead_code)]

use axum_test::TestServer;
use shelf_social::application::services::auth_service::hash_token;
use shelf_social::application::services::social_service::DEFAULT_FEED_PAGE_SIZE;
use shelf_social::domain::access::Capability;
use shelf_social::domain::entities::{
    Author, AuthorDraft, Authors, Book, BookDraft, Books, Comment, CommentDraft, Comments,
    NewUser, Post, PostDraft, Posts, User,
};
use shelf_social::domain::repositories::{ResourceRepository, TokenRepository, UserRepository};
use shelf_social::infrastructure::persistence::{MemoryStore, Repositories};
use shelf_social::routes::{RouterOptions, router};
use shelf_social::state::AppState;
use std::sync::Arc;

pub const TEST_SECRET: &str = "test-signing-secret";

/// A server over a fresh in-memory store. The store is kept for seeding.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
}

pub fn create_test_state(store: Arc<MemoryStore>) -> AppState {
    AppState::from_repositories(
        Repositories::memory(store),
        TEST_SECRET.to_string(),
        DEFAULT_FEED_PAGE_SIZE,
    )
}

pub fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let app = router(
        create_test_state(store.clone()),
        RouterOptions {
            rate_limit: false,
            behind_proxy: false,
        },
    );

    TestApp {
        server: TestServer::new(app).unwrap(),
        store,
    }
}

/// Creates a user holding `capabilities` and returns it with a raw API token.
pub async fn create_test_user(
    store: &MemoryStore,
    username: &str,
    capabilities: &[Capability],
) -> (User, String) {
    let user = UserRepository::create(
        store,
        NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: String::new(),
            is_superuser: false,
        },
    )
    .await
    .unwrap();

    for capability in capabilities {
        store
            .set_capability(user.id, *capability, true)
            .await
            .unwrap();
    }

    let token = format!("{username}-token");
    store
        .create_token(user.id, "test", &hash_token(TEST_SECRET, &token))
        .await
        .unwrap();

    let user = UserRepository::find_by_id(store, user.id)
        .await
        .unwrap()
        .unwrap();
    (user, token)
}

/// A user holding every capability.
pub async fn create_librarian(store: &MemoryStore, username: &str) -> (User, String) {
    create_test_user(store, username, &Capability::ALL).await
}

pub async fn create_test_author(store: &MemoryStore, name: &str) -> Author {
    ResourceRepository::<Authors>::insert(
        store,
        AuthorDraft {
            name: name.to_string(),
        },
    )
    .await
    .unwrap()
}

pub async fn create_test_book(
    store: &MemoryStore,
    title: &str,
    publication_year: i32,
    author_id: i64,
) -> Book {
    ResourceRepository::<Books>::insert(
        store,
        BookDraft {
            title: title.to_string(),
            publication_year,
            author_id,
        },
    )
    .await
    .unwrap()
}

pub async fn create_test_post(store: &MemoryStore, author_id: i64, title: &str) -> Post {
    ResourceRepository::<Posts>::insert(
        store,
        PostDraft {
            title: title.to_string(),
            content: format!("{title} content"),
            author_id,
        },
    )
    .await
    .unwrap()
}

pub async fn create_test_comment(
    store: &MemoryStore,
    post_id: i64,
    author_id: i64,
    content: &str,
) -> Comment {
    ResourceRepository::<Comments>::insert(
        store,
        CommentDraft {
            content: content.to_string(),
            post_id,
            author_id,
        },
    )
    .await
    .unwrap()
}
