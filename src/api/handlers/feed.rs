//! Handler for the personal feed.

use axum::{Json, extract::State};

use crate::api::dto::feed::{FeedParams, FeedResponse};
use crate::api::extract::QueryParams;
use crate::domain::access::Actor;
use crate::error::AppError;
use crate::state::AppState;

/// Posts by followed users, newest first.
///
/// # Endpoint
///
/// `GET /api/feed?page=1`
///
/// # Errors
///
/// Returns 401 for anonymous callers and 400 for page 0.
pub async fn feed_handler(
    State(state): State<AppState>,
    actor: Actor,
    QueryParams(params): QueryParams<FeedParams>,
) -> Result<Json<FeedResponse>, AppError> {
    let page = params.page();
    let results = state.social_service.feed(&actor, page).await?;

    Ok(Json(FeedResponse {
        page,
        page_size: state.social_service.feed_page_size(),
        results,
    }))
}
