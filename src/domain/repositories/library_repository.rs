//! Repository trait for libraries, their holdings and librarians.

use async_trait::async_trait;

use crate::domain::entities::{Book, Librarian, Library};
use crate::error::AppError;

/// Repository interface for library holdings.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLibraryRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryStore`] - in-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LibraryRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if a library with this name exists.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn create_library(&self, name: &str) -> Result<Library, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_library_by_name(&self, name: &str) -> Result<Option<Library>, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn list_libraries(&self) -> Result<Vec<Library>, AppError>;

    /// Adds a book to a library's holdings. Adding it twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the library or book does not exist.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn add_book(&self, library_id: i64, book_id: i64) -> Result<(), AppError>;

    /// Books held by a library, ordered by title then id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn books_in_library(&self, library_id: i64) -> Result<Vec<Book>, AppError>;

    /// Assigns the librarian of a library, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the library does not exist.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn assign_librarian(&self, library_id: i64, name: &str)
    -> Result<Librarian, AppError>;

    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn librarian_for(&self, library_id: i64) -> Result<Option<Librarian>, AppError>;
}
