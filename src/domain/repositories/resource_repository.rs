//! Repository trait shared by every CRUD resource.

use async_trait::async_trait;

use crate::domain::query::ListQuery;
use crate::domain::resource::{Reference, Resource};
use crate::error::AppError;

/// Storage primitives for one [`Resource`].
///
/// Every method is a single atomic unit: a write either becomes fully
/// visible or leaves no trace.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgResourceRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryStore`] - in-process implementation
#[async_trait]
pub trait ResourceRepository<R: Resource>: Send + Sync {
    /// Lists records matching the query, ordered and paginated as it specifies.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn list(&self, query: &ListQuery) -> Result<Vec<R::Entity>, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<R::Entity>, AppError>;

    /// Persists a validated draft and returns the stored record with its new id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if a referenced record vanished
    /// between validation and insertion.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn insert(&self, draft: R::Draft) -> Result<R::Entity, AppError>;

    /// Overwrites every writable field of a record.
    ///
    /// Returns `Ok(None)` if no record has this id.
    ///
    /// # Errors
    ///
    /// Same as [`Self::insert`].
    async fn replace(&self, id: i64, draft: R::Draft) -> Result<Option<R::Entity>, AppError>;

    /// Deletes a record and its cascade dependents.
    ///
    /// Returns `Ok(false)` if no record has this id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Checks that a foreign key carried by a draft resolves.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn reference_exists(&self, reference: &Reference) -> Result<bool, AppError>;
}
