//! HTTP server initialization and runtime setup.
//!
//! Handles the store selection, database connections, migrations, and the Axum server lifecycle.

use crate::application::services::auth_service::{generate_token, hash_password, hash_token};
use crate::config::Config;
use crate::domain::entities::{NewUser, User};
use crate::domain::repositories::{TokenRepository, UserRepository};
use crate::error::AppError;
use crate::infrastructure::persistence::{MemoryStore, Repositories};
use crate::routes::{RouterOptions, app_router};
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

const BOOTSTRAP_ADMIN: &str = "admin";

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations, or the in-memory store
/// - Application services
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let repositories = connect_store(&config).await?;

    let state = AppState::from_repositories(
        repositories,
        config.token_signing_secret.clone(),
        config.feed_page_size,
    );

    let app = app_router(
        state,
        RouterOptions {
            rate_limit: config.rate_limit,
            behind_proxy: config.behind_proxy,
        },
    );

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn connect_store(config: &Config) -> Result<Repositories> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("No database configured, data will not survive a restart");
        let store = Arc::new(MemoryStore::new());
        match config.bootstrap_admin_token.as_deref() {
            Some(token) => {
                let admin = seed_admin(&store, &config.token_signing_secret, token)
                    .await
                    .context("Failed to seed bootstrap admin")?;
                tracing::info!(user_id = admin.id, "Seeded superuser '{}'", admin.username);
            }
            None => tracing::warn!(
                "BOOTSTRAP_ADMIN_TOKEN is not set, so the in-memory store has no users \
                 and only anonymous reads will succeed"
            ),
        }
        return Ok(Repositories::memory(store));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    Ok(Repositories::postgres(Arc::new(pool)))
}

/// Creates the superuser `admin` with a bearer token of `token`.
///
/// The account has no usable password; it authenticates by token only.
///
/// # Errors
///
/// Returns [`AppError::Conflict`] if `admin` or the token already exists.
pub async fn seed_admin(store: &MemoryStore, secret: &str, token: &str) -> Result<User, AppError> {
    let admin = store
        .create(NewUser {
            username: BOOTSTRAP_ADMIN.to_string(),
            email: String::new(),
            password_hash: hash_password(secret, &generate_token()),
            is_superuser: true,
        })
        .await?;
    store
        .create_token(admin.id, "bootstrap", &hash_token(secret, token))
        .await?;
    Ok(admin)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
