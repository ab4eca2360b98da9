//! Repository trait for user accounts and the following graph.

use async_trait::async_trait;

use crate::domain::access::Capability;
use crate::domain::entities::{NewUser, ProfileUpdate, User};
use crate::error::AppError;

/// Repository interface for users.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUserRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryStore`] - in-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the username is taken.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Lists every user ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn list(&self) -> Result<Vec<User>, AppError>;

    /// Applies the supplied profile fields. Returns `Ok(None)` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn update_profile(&self, id: i64, update: ProfileUpdate)
    -> Result<Option<User>, AppError>;

    /// Adds `target_id` to the following set of `user_id`. Adding an existing
    /// member is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn follow(&self, user_id: i64, target_id: i64) -> Result<(), AppError>;

    /// Removes `target_id` from the following set of `user_id`. Removing a
    /// missing member is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn unfollow(&self, user_id: i64, target_id: i64) -> Result<(), AppError>;

    /// Grants or revokes one capability. Returns `Ok(false)` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn set_capability(
        &self,
        user_id: i64,
        capability: Capability,
        granted: bool,
    ) -> Result<bool, AppError>;
}
