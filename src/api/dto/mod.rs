//! Data Transfer Objects for HTTP API requests and responses.
//!
//! Resource endpoints serialize domain entities directly; the types here
//! cover the endpoints whose shape differs from a stored record.

pub mod account;
pub mod catalog;
pub mod feed;
pub mod health;
