//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{
    AuthService, CatalogService, ResourceService, SocialService,
};
use crate::domain::access::{AuthenticatedOrReadOnly, CapabilityGate, OwnerOrReadOnly};
use crate::domain::entities::{Authors, Books, Comments, Posts};
use crate::domain::repositories::{
    LibraryRepository, StoreHealth, TokenRepository, UserRepository,
};
use crate::infrastructure::persistence::Repositories;

#[derive(Clone)]
pub struct AppState {
    pub authors: Arc<ResourceService<Authors>>,
    pub books: Arc<ResourceService<Books>>,
    pub posts: Arc<ResourceService<Posts>>,
    pub comments: Arc<ResourceService<Comments>>,
    pub catalog_service: Arc<CatalogService<dyn LibraryRepository>>,
    pub social_service: Arc<SocialService<dyn UserRepository>>,
    pub auth_service: Arc<AuthService<dyn TokenRepository, dyn UserRepository>>,
    pub health: Arc<dyn StoreHealth>,
}

impl AppState {
    /// Wires every service to its repositories and authorization policy.
    ///
    /// | resource | policy |
    /// |---|---|
    /// | authors | authenticated or read-only |
    /// | books | capability gate |
    /// | posts, comments | owner or read-only |
    pub fn from_repositories(
        repos: Repositories,
        token_signing_secret: String,
        feed_page_size: u32,
    ) -> Self {
        Self {
            authors: Arc::new(ResourceService::new(
                repos.authors.clone(),
                Arc::new(AuthenticatedOrReadOnly),
            )),
            books: Arc::new(ResourceService::new(
                repos.books.clone(),
                Arc::new(CapabilityGate),
            )),
            posts: Arc::new(ResourceService::new(
                repos.posts.clone(),
                Arc::new(OwnerOrReadOnly),
            )),
            comments: Arc::new(ResourceService::new(repos.comments, Arc::new(OwnerOrReadOnly))),
            catalog_service: Arc::new(CatalogService::new(
                repos.authors,
                repos.books,
                repos.libraries,
            )),
            social_service: Arc::new(SocialService::new(
                repos.users.clone(),
                repos.posts,
                feed_page_size,
            )),
            auth_service: Arc::new(AuthService::new(
                repos.tokens,
                repos.users,
                token_signing_secret,
            )),
            health: repos.health,
        }
    }
}
