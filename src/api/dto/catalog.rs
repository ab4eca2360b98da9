//! DTOs for catalog traversal endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Librarian, Library};
use crate::error::AppError;

/// `?author=<name>`
#[derive(Debug, Deserialize)]
pub struct AuthorParams {
    pub author: Option<String>,
}

/// `?library=<name>`
#[derive(Debug, Deserialize)]
pub struct LibraryParams {
    pub library: Option<String>,
}

/// Returns the trimmed value of a required query parameter.
pub fn required_param(name: &str, value: Option<String>) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::bad_request(format!(
            "Query parameter '{name}' is required"
        ))),
    }
}

/// A library with its librarian, which may not be assigned yet.
#[derive(Debug, Serialize)]
pub struct LibrarianResponse {
    pub library: Library,
    pub librarian: Option<Librarian>,
}
