//! API route configuration.
//!
//! Every endpoint passes through [`crate::api::middleware::auth`], which
//! resolves the caller; access is then decided per resource by its policy.

use crate::api::handlers::{
    ResourceEndpoint, books_by_author_handler, create_handler, delete_handler, feed_handler,
    follow_handler, librarian_handler, library_books_handler, list_handler,
    partial_update_handler, profile_handler, retrieve_handler, unfollow_handler,
    update_handler, update_profile_handler,
};
use crate::domain::entities::{Authors, Books, Comments, Posts};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// All API routes, mounted under `/api`.
///
/// # Endpoints
///
/// - `GET, POST            /{resource}`      - List / create
/// - `GET, PUT, PATCH, DELETE /{resource}/{id}` - Retrieve / update / delete
///   for `authors`, `books`, `posts` and `comments`
/// - `GET   /catalog/books-by-author?author=` - Books by author name
/// - `GET   /catalog/library-books?library=`  - Books held by a library
/// - `GET   /catalog/librarian?library=`      - A library's librarian
/// - `GET, PATCH /accounts/profile`           - The caller's profile
/// - `POST  /accounts/follow/{id}`            - Follow a user
/// - `POST  /accounts/unfollow/{id}`          - Unfollow a user
/// - `GET   /feed?page=`                      - Posts by followed users
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(resource_routes::<Authors>("/authors"))
        .merge(resource_routes::<Books>("/books"))
        .merge(resource_routes::<Posts>("/posts"))
        .merge(resource_routes::<Comments>("/comments"))
        .route("/catalog/books-by-author", get(books_by_author_handler))
        .route("/catalog/library-books", get(library_books_handler))
        .route("/catalog/librarian", get(librarian_handler))
        .route(
            "/accounts/profile",
            get(profile_handler).patch(update_profile_handler),
        )
        .route("/accounts/follow/{id}", post(follow_handler))
        .route("/accounts/unfollow/{id}", post(unfollow_handler))
        .route("/feed", get(feed_handler))
}

/// Collection and item routes for one resource.
fn resource_routes<R: ResourceEndpoint>(path: &str) -> Router<AppState> {
    Router::new()
        .route(path, get(list_handler::<R>).post(create_handler::<R>))
        .route(
            &format!("{path}/{{id}}"),
            get(retrieve_handler::<R>)
                .put(update_handler::<R>)
                .patch(partial_update_handler::<R>)
                .delete(delete_handler::<R>),
        )
}
