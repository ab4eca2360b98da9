//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod accounts;
pub mod catalog;
pub mod feed;
pub mod health;
pub mod resources;

pub use accounts::{follow_handler, profile_handler, unfollow_handler, update_profile_handler};
pub use catalog::{books_by_author_handler, librarian_handler, library_books_handler};
pub use feed::feed_handler;
pub use health::health_handler;
pub use resources::{
    ResourceEndpoint, create_handler, delete_handler, list_handler, partial_update_handler,
    retrieve_handler, update_handler,
};
