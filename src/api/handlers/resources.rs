//! Generic handlers serving every CRUD resource.
//!
//! Routes are registered once per resource with the handler instantiated
//! for its marker type, e.g. `get(list_handler::<Books>)`.

use std::collections::HashMap;

use axum::{Json, extract::State, http::StatusCode};

use crate::api::extract::{PathParam, QueryParams, RawBody};
use crate::application::services::ResourceService;
use crate::domain::access::Actor;
use crate::domain::entities::{Authors, Books, Comments, Posts};
use crate::domain::resource::Resource;
use crate::error::AppError;
use crate::state::AppState;

/// A resource exposed over HTTP, with its service in [`AppState`].
pub trait ResourceEndpoint: Resource + Sized {
    fn service(state: &AppState) -> &ResourceService<Self>;
}

impl ResourceEndpoint for Authors {
    fn service(state: &AppState) -> &ResourceService<Self> {
        &state.authors
    }
}

impl ResourceEndpoint for Books {
    fn service(state: &AppState) -> &ResourceService<Self> {
        &state.books
    }
}

impl ResourceEndpoint for Posts {
    fn service(state: &AppState) -> &ResourceService<Self> {
        &state.posts
    }
}

impl ResourceEndpoint for Comments {
    fn service(state: &AppState) -> &ResourceService<Self> {
        &state.comments
    }
}

/// Lists records, filtered, searched, ordered and optionally paginated.
///
/// # Endpoint
///
/// `GET /api/{resource}?field=value&search=term&ordering=-field&page=1&page_size=25`
///
/// Unknown parameters are ignored.
pub async fn list_handler<R: ResourceEndpoint>(
    State(state): State<AppState>,
    actor: Actor,
    QueryParams(params): QueryParams<HashMap<String, String>>,
) -> Result<Json<Vec<R::Entity>>, AppError> {
    let items = R::service(&state).list_params(&actor, &params).await?;
    Ok(Json(items))
}

/// `GET /api/{resource}/{id}`
pub async fn retrieve_handler<R: ResourceEndpoint>(
    State(state): State<AppState>,
    actor: Actor,
    PathParam(id): PathParam<i64>,
) -> Result<Json<R::Entity>, AppError> {
    let entity = R::service(&state).retrieve(&actor, id).await?;
    Ok(Json(entity))
}

/// Creates a record.
///
/// # Endpoint
///
/// `POST /api/{resource}`
///
/// # Errors
///
/// Returns 401/403 if the caller may not create, whatever the body holds,
/// and 400 with every field error if validation fails.
pub async fn create_handler<R: ResourceEndpoint>(
    State(state): State<AppState>,
    actor: Actor,
    RawBody(body): RawBody,
) -> Result<(StatusCode, Json<R::Entity>), AppError> {
    let entity = R::service(&state).create_json(&actor, &body).await?;
    Ok((StatusCode::CREATED, Json(entity)))
}

/// Replaces every writable field of a record.
///
/// # Endpoint
///
/// `PUT /api/{resource}/{id}`
pub async fn update_handler<R: ResourceEndpoint>(
    State(state): State<AppState>,
    actor: Actor,
    PathParam(id): PathParam<i64>,
    RawBody(body): RawBody,
) -> Result<Json<R::Entity>, AppError> {
    let entity = R::service(&state).update_json(&actor, id, &body, false).await?;
    Ok(Json(entity))
}

/// Updates only the supplied fields of a record.
///
/// # Endpoint
///
/// `PATCH /api/{resource}/{id}`
pub async fn partial_update_handler<R: ResourceEndpoint>(
    State(state): State<AppState>,
    actor: Actor,
    PathParam(id): PathParam<i64>,
    RawBody(body): RawBody,
) -> Result<Json<R::Entity>, AppError> {
    let entity = R::service(&state).update_json(&actor, id, &body, true).await?;
    Ok(Json(entity))
}

/// `DELETE /api/{resource}/{id}`, answering 204 on success.
pub async fn delete_handler<R: ResourceEndpoint>(
    State(state): State<AppState>,
    actor: Actor,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode, AppError> {
    R::service(&state).delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
