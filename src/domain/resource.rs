//! The validated CRUD resource contract.
//!
//! A [`Resource`] ties together a stored entity, the JSON payload that writes
//! it, and the validated draft handed to the repository. Every resource is
//! served by the same [`crate::application::services::ResourceService`]
//! pipeline, so the per-type code is limited to field rules and schema.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::domain::access::{Owned, Principal};
use crate::domain::query::QuerySchema;
use crate::domain::validation::{FieldErrors, REQUIRED, ValidationContext};

/// Every persisted record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Author,
    Book,
    Library,
    Librarian,
    User,
    Post,
    Comment,
}

impl EntityKind {
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Author => "authors",
            EntityKind::Book => "books",
            EntityKind::Library => "libraries",
            EntityKind::Librarian => "librarians",
            EntityKind::User => "users",
            EntityKind::Post => "posts",
            EntityKind::Comment => "comments",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Author => "author",
            EntityKind::Book => "book",
            EntityKind::Library => "library",
            EntityKind::Librarian => "librarian",
            EntityKind::User => "user",
            EntityKind::Post => "post",
            EntityKind::Comment => "comment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which write is being validated, with the stored record for updates.
#[derive(Debug, Clone, Copy)]
pub enum WriteMode<'a, E> {
    Create,
    /// Full update: every writable field must be supplied.
    Replace(&'a E),
    /// Partial update: omitted fields keep their stored value.
    Patch(&'a E),
}

impl<'a, E> WriteMode<'a, E> {
    pub fn existing(&self) -> Option<&'a E> {
        match self {
            WriteMode::Create => None,
            WriteMode::Replace(e) | WriteMode::Patch(e) => Some(e),
        }
    }

    /// Resolves the value a writable field will have after the write.
    ///
    /// A supplied value always wins. An omitted value falls back to the stored
    /// one on a partial update and is reported as [`REQUIRED`] otherwise.
    pub fn resolve<T: Clone>(
        &self,
        errors: &mut FieldErrors,
        field: &str,
        supplied: Option<&T>,
        current: impl FnOnce(&E) -> T,
    ) -> Option<T> {
        match (supplied, self) {
            (Some(value), _) => Some(value.clone()),
            (None, WriteMode::Patch(existing)) => Some(current(existing)),
            (None, _) => {
                errors.add(field, REQUIRED);
                None
            }
        }
    }
}

/// A foreign key in a draft that must resolve before the write is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub field: &'static str,
    pub kind: EntityKind,
    pub id: i64,
}

impl Reference {
    pub fn missing_message(&self) -> String {
        format!("Invalid pk \"{}\" - object does not exist.", self.id)
    }
}

/// Binds an entity type to its payload, draft, schema and field rules.
pub trait Resource: Send + Sync + 'static {
    type Entity: Clone + fmt::Debug + Send + Sync + Serialize + Owned + 'static;
    /// Write payload; every writable field is optional so one type serves
    /// create, full update and partial update.
    type Input: Validate + DeserializeOwned + fmt::Debug + Send + Sync + 'static;
    /// Validated, complete field set handed to the repository.
    type Draft: Clone + fmt::Debug + Send + Sync + 'static;

    const KIND: EntityKind;

    fn schema() -> &'static QuerySchema;

    fn id(entity: &Self::Entity) -> i64;

    /// Applies the syntactic field rules and assembles the draft.
    ///
    /// Returns `None` when any required field could not be resolved; every
    /// failure is recorded in `errors` either way.
    fn build_draft(
        input: &Self::Input,
        mode: WriteMode<'_, Self::Entity>,
        author: &Principal,
        ctx: &ValidationContext,
        errors: &mut FieldErrors,
    ) -> Option<Self::Draft>;

    /// Foreign keys carried by the draft.
    fn references(_draft: &Self::Draft) -> Vec<Reference> {
        Vec::new()
    }
}
