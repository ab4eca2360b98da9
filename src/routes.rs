//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health` - Health check (public)
//! - `/api/*`       - REST API (anonymous or Bearer token)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Security headers** - `Content-Security-Policy`, `X-Content-Type-Options`
//! - **Rate limiting** - Per-IP token bucket on `/api` (optional)
//! - **Authentication** - Bearer token actor resolution
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::{auth, rate_limit, security, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Switches for the optional parts of the middleware stack.
#[derive(Debug, Clone, Copy)]
pub struct RouterOptions {
    pub rate_limit: bool,
    /// Read client IPs from proxy headers; enable only behind a trusted
    /// reverse proxy.
    pub behind_proxy: bool,
}

/// Builds the router with all routes and middleware except path normalization.
pub fn router(state: AppState, options: RouterOptions) -> Router {
    let mut api_router = api::routes::api_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    if options.rate_limit {
        api_router = if options.behind_proxy {
            api_router.layer(rate_limit::proxied_layer())
        } else {
            api_router.layer(rate_limit::layer())
        };
    }

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .with_state(state)
        .layer(security::csp_layer())
        .layer(security::nosniff_layer())
        .layer(tracing::layer())
}

/// Constructs the application router, accepting paths with a trailing slash.
pub fn app_router(state: AppState, options: RouterOptions) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state, options))
}
