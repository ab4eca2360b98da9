//! Bearer token authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;

use crate::{domain::access::Actor, error::AppError, state::AppState};

/// Resolves the [`Actor`] issuing the request and stores it in the request
/// extensions for handlers to extract.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Authentication Flow
///
/// 1. No `Authorization` header: the request continues as [`Actor::Anonymous`]
/// 2. Extract token from the header
/// 3. Look up the token hash, rejecting revoked tokens
/// 4. Load the token's user and update `last_used_at`
/// 5. Continue to next middleware/handler as [`Actor::User`]
///
/// Whether an anonymous actor may proceed is decided per resource by its
/// authorization policy.
///
/// # Errors
///
/// Returns `401 Unauthorized` if:
/// - Token format is invalid
/// - Token is not found or revoked
///
/// Adds `WWW-Authenticate: Bearer` header to 401 responses per RFC 6750.
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, routing::get, middleware};
/// use crate::api::middleware::auth;
///
/// let api = Router::new()
///     .route("/api/books", get(list_handler::<Books>))
///     .layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let actor = if parts.headers.contains_key(AUTHORIZATION) {
        let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
            .await
            .map_err(|_| {
                AppError::unauthorized(
                    "Invalid token header.",
                    serde_json::json!({"reason": "Authorization header must be 'Bearer <token>'"}),
                )
            })?;

        st.auth_service.authenticate(&token).await?
    } else {
        Actor::Anonymous
    };

    if let Some(principal) = actor.principal() {
        tracing::debug!(user_id = principal.id, username = %principal.username, "Authenticated request");
    }

    parts.extensions.insert(actor);
    let req = Request::from_parts(parts, body);

    Ok(next.run(req).await)
}
