//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access and are implemented by the PostgreSQL
//! repositories and the in-memory store in `crate::infrastructure::persistence`.
//! Non-generic traits get `mockall` mocks under `cfg(test)`.
//!
//! # Available Repositories
//!
//! - [`ResourceRepository`] - CRUD storage for one resource type
//! - [`UserRepository`] - Accounts, capabilities and following
//! - [`TokenRepository`] - API token authentication
//! - [`LibraryRepository`] - Library holdings and librarians
//! - [`StoreHealth`] - Store liveness

pub mod library_repository;
pub mod resource_repository;
pub mod store_health;
pub mod token_repository;
pub mod user_repository;

pub use library_repository::LibraryRepository;
pub use resource_repository::ResourceRepository;
pub use store_health::StoreHealth;
pub use token_repository::{ApiToken, TokenRepository};
pub use user_repository::UserRepository;

#[cfg(test)]
pub use library_repository::MockLibraryRepository;
#[cfg(test)]
pub use store_health::MockStoreHealth;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
