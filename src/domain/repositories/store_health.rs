//! Liveness check for the backing store.

use async_trait::async_trait;

use crate::error::AppError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Short backend name reported by `/health`, e.g. `postgres` or `memory`.
    fn backend(&self) -> &'static str;

    /// Round-trips a trivial request to the store.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the store is unreachable.
    async fn ping(&self) -> Result<(), AppError>;
}
