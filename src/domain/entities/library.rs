//! Library and librarian entities.

use serde::Serialize;

/// A library. Holds many books and at most one librarian.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Library {
    pub id: i64,
    pub name: String,
}

/// The single librarian assigned to a library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Librarian {
    pub id: i64,
    pub name: String,
    #[serde(rename = "library")]
    pub library_id: i64,
}
