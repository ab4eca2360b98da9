//! Application layer services implementing business logic.
//!
//! Services consume repository traits, enforce authorization and validation,
//! and give HTTP handlers a narrow API.
//!
//! # Available Services
//!
//! - [`services::resource_service::ResourceService`] - Validated CRUD for one resource
//! - [`services::catalog_service::CatalogService`] - Author/library traversals
//! - [`services::social_service::SocialService`] - Following, feed and profile
//! - [`services::auth_service::AuthService`] - Bearer token authentication

pub mod services;
