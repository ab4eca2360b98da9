//! Handlers for the caller's account and the following graph.

use axum::{Json, extract::State};

use crate::api::dto::account::FollowResponse;
use crate::api::extract::{JsonBody, PathParam};
use crate::domain::access::Actor;
use crate::domain::entities::{ProfileUpdate, User};
use crate::error::AppError;
use crate::state::AppState;

/// `GET /api/accounts/profile`
pub async fn profile_handler(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.social_service.profile(&actor).await?))
}

/// Updates `email` and/or `bio` of the caller.
///
/// # Endpoint
///
/// `PATCH /api/accounts/profile`
pub async fn update_profile_handler(
    State(state): State<AppState>,
    actor: Actor,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    Ok(Json(
        state.social_service.update_profile(&actor, update).await?,
    ))
}

/// Follows a user.
///
/// # Endpoint
///
/// `POST /api/accounts/follow/{id}`
///
/// # Errors
///
/// Returns 400 when following yourself and 404 for an unknown user.
pub async fn follow_handler(
    State(state): State<AppState>,
    actor: Actor,
    PathParam(id): PathParam<i64>,
) -> Result<Json<FollowResponse>, AppError> {
    let target = state.social_service.follow(&actor, id).await?;
    Ok(Json(FollowResponse::followed(&target.username)))
}

/// `POST /api/accounts/unfollow/{id}`
pub async fn unfollow_handler(
    State(state): State<AppState>,
    actor: Actor,
    PathParam(id): PathParam<i64>,
) -> Result<Json<FollowResponse>, AppError> {
    let target = state.social_service.unfollow(&actor, id).await?;
    Ok(Json(FollowResponse::unfollowed(&target.username)))
}
