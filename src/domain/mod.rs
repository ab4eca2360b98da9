//! Domain layer containing business entities and rules.
//!
//! Nothing in this layer knows about HTTP or SQL.
//!
//! # Architecture
//!
//! - [`entities`] - Records, write payloads and per-resource schemas
//! - [`repositories`] - Data access trait definitions
//! - [`resource`] - The validated CRUD resource contract
//! - [`access`] - Actors, capabilities and authorization policies
//! - [`validation`] - Field error accumulation and shared field rules
//! - [`query`] - Filter, search, ordering and pagination for list operations

pub mod access;
pub mod entities;
pub mod query;
pub mod repositories;
pub mod resource;
pub mod validation;
