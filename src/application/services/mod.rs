//! Business logic services for the application layer.

pub mod auth_service;
pub mod catalog_service;
pub mod resource_service;
pub mod social_service;

pub use auth_service::AuthService;
pub use catalog_service::CatalogService;
pub use resource_service::ResourceService;
pub use social_service::SocialService;
