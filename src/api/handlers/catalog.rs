//! Handlers for catalog traversal endpoints.

use axum::{Json, extract::State};

use crate::api::dto::catalog::{AuthorParams, LibrarianResponse, LibraryParams, required_param};
use crate::api::extract::QueryParams;
use crate::domain::access::Actor;
use crate::domain::entities::Book;
use crate::error::AppError;
use crate::state::AppState;

/// Books by the author with this exact name.
///
/// # Endpoint
///
/// `GET /api/catalog/books-by-author?author=<name>`
///
/// # Errors
///
/// Returns 404 if no author has this name.
pub async fn books_by_author_handler(
    State(state): State<AppState>,
    actor: Actor,
    QueryParams(params): QueryParams<AuthorParams>,
) -> Result<Json<Vec<Book>>, AppError> {
    let name = required_param("author", params.author)?;
    let books = state.catalog_service.books_by_author(&actor, &name).await?;
    Ok(Json(books))
}

/// Books held by the library with this name.
///
/// # Endpoint
///
/// `GET /api/catalog/library-books?library=<name>`
///
/// # Errors
///
/// Returns 404 if no library has this name.
pub async fn library_books_handler(
    State(state): State<AppState>,
    actor: Actor,
    QueryParams(params): QueryParams<LibraryParams>,
) -> Result<Json<Vec<Book>>, AppError> {
    let name = required_param("library", params.library)?;
    let books = state.catalog_service.books_in_library(&actor, &name).await?;
    Ok(Json(books))
}

/// The library with this name and its librarian, `null` when unassigned.
///
/// # Endpoint
///
/// `GET /api/catalog/librarian?library=<name>`
pub async fn librarian_handler(
    State(state): State<AppState>,
    actor: Actor,
    QueryParams(params): QueryParams<LibraryParams>,
) -> Result<Json<LibrarianResponse>, AppError> {
    let name = required_param("library", params.library)?;
    let (library, librarian) = state
        .catalog_service
        .librarian_for_library(&actor, &name)
        .await?;

    Ok(Json(LibrarianResponse { library, librarian }))
}
