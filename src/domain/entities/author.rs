//! Author entity and its resource definition.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::access::{Owned, Principal};
use crate::domain::entities::Book;
use crate::domain::query::{FieldKind, FieldSpec, FieldValue, QuerySchema, Queryable};
use crate::domain::resource::{EntityKind, Resource, WriteMode};
use crate::domain::validation::{FieldErrors, ValidationContext, check_not_blank};

/// A book author. Owns zero or more books; deleting an author deletes them.
///
/// `books` is read-only and ordered by title, then id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub books: Vec<Book>,
}

impl Owned for Author {}

impl Queryable for Author {
    fn id(&self) -> i64 {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(FieldValue::Integer(self.id)),
            "name" => Some(FieldValue::Text(self.name.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AuthorInput {
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorDraft {
    pub name: String,
}

static AUTHOR_FIELDS: [FieldSpec; 2] = [
    FieldSpec::new("id", "a.id", FieldKind::Integer),
    FieldSpec::new("name", "a.name", FieldKind::Text),
];

pub static AUTHOR_SCHEMA: QuerySchema = QuerySchema {
    id_column: "a.id",
    fields: &AUTHOR_FIELDS,
    filter_fields: &["name"],
    search_fields: &["name"],
    ordering_fields: &["name", "id"],
    default_ordering: &["name"],
};

/// `/api/authors`
pub struct Authors;

impl Resource for Authors {
    type Entity = Author;
    type Input = AuthorInput;
    type Draft = AuthorDraft;

    const KIND: EntityKind = EntityKind::Author;

    fn schema() -> &'static QuerySchema {
        &AUTHOR_SCHEMA
    }

    fn id(entity: &Author) -> i64 {
        entity.id
    }

    fn build_draft(
        input: &AuthorInput,
        mode: WriteMode<'_, Author>,
        _author: &Principal,
        _ctx: &ValidationContext,
        errors: &mut FieldErrors,
    ) -> Option<AuthorDraft> {
        if let Some(name) = &input.name {
            check_not_blank(errors, "name", name);
        }
        let name = mode.resolve(errors, "name", input.name.as_ref(), |a| a.name.clone())?;

        Some(AuthorDraft { name })
    }
}
