//! Repository implementations.
//!
//! PostgreSQL repositories build their SQL at runtime with [`sqlx::QueryBuilder`];
//! list queries are translated by [`sql::push_list_clauses`]. [`MemoryStore`]
//! implements every trait in-process and backs the server when no database
//! is configured.
//!
//! # Repositories
//!
//! - [`PgResourceRepository`] - Authors, books, posts and comments
//! - [`PgUserRepository`] - Accounts, capabilities and following
//! - [`PgTokenRepository`] - API token storage and validation
//! - [`PgLibraryRepository`] - Library holdings and librarians
//! - [`PgStoreHealth`] - Database liveness
//! - [`MemoryStore`] - All of the above, in memory

use std::sync::Arc;

use sqlx::PgPool;

use crate::domain::entities::{Authors, Books, Comments, Posts};
use crate::domain::repositories::{
    LibraryRepository, ResourceRepository, StoreHealth, TokenRepository, UserRepository,
};

pub mod memory;
pub mod pg_library_repository;
pub mod pg_resource_repository;
pub mod pg_store_health;
pub mod pg_token_repository;
pub mod pg_user_repository;
pub mod sql;

pub use memory::MemoryStore;
pub use pg_library_repository::PgLibraryRepository;
pub use pg_resource_repository::{PgResource, PgResourceRepository};
pub use pg_store_health::PgStoreHealth;
pub use pg_token_repository::PgTokenRepository;
pub use pg_user_repository::PgUserRepository;

/// One handle per repository trait, all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
    pub authors: Arc<dyn ResourceRepository<Authors>>,
    pub books: Arc<dyn ResourceRepository<Books>>,
    pub posts: Arc<dyn ResourceRepository<Posts>>,
    pub comments: Arc<dyn ResourceRepository<Comments>>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub libraries: Arc<dyn LibraryRepository>,
    pub health: Arc<dyn StoreHealth>,
}

impl Repositories {
    pub fn postgres(pool: Arc<PgPool>) -> Self {
        Self {
            authors: Arc::new(PgResourceRepository::<Authors>::new(pool.clone())),
            books: Arc::new(PgResourceRepository::<Books>::new(pool.clone())),
            posts: Arc::new(PgResourceRepository::<Posts>::new(pool.clone())),
            comments: Arc::new(PgResourceRepository::<Comments>::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            tokens: Arc::new(PgTokenRepository::new(pool.clone())),
            libraries: Arc::new(PgLibraryRepository::new(pool.clone())),
            health: Arc::new(PgStoreHealth::new(pool)),
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            authors: store.clone(),
            books: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            users: store.clone(),
            tokens: store.clone(),
            libraries: store.clone(),
            health: store,
        }
    }
}
