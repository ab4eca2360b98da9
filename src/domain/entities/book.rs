//! Book entity and its resource definition.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::access::{Owned, Principal};
use crate::domain::query::{FieldKind, FieldSpec, FieldValue, QuerySchema, Queryable};
use crate::domain::resource::{EntityKind, Reference, Resource, WriteMode};
use crate::domain::validation::{
    FieldErrors, ValidationContext, check_not_blank, check_publication_year,
};

/// A book. Belongs to exactly one author.
///
/// The foreign key is exposed as `author` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub publication_year: i32,
    #[serde(rename = "author")]
    pub author_id: i64,
}

impl Owned for Book {}

/// A book joined with its author's name, as seen by list queries.
#[derive(Debug, Clone)]
pub struct BookRow {
    pub book: Book,
    pub author_name: String,
}

impl Queryable for BookRow {
    fn id(&self) -> i64 {
        self.book.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(FieldValue::Integer(self.book.id)),
            "title" => Some(FieldValue::Text(self.book.title.clone())),
            "publication_year" => Some(FieldValue::Integer(i64::from(self.book.publication_year))),
            "author" => Some(FieldValue::Integer(self.book.author_id)),
            "author__name" => Some(FieldValue::Text(self.author_name.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BookInput {
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub title: Option<String>,
    pub publication_year: Option<i32>,
    pub author: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub publication_year: i32,
    pub author_id: i64,
}

static BOOK_FIELDS: [FieldSpec; 5] = [
    FieldSpec::new("id", "b.id", FieldKind::Integer),
    FieldSpec::new("title", "b.title", FieldKind::Text),
    FieldSpec::new("publication_year", "b.publication_year", FieldKind::Integer),
    FieldSpec::new("author", "b.author_id", FieldKind::Integer),
    FieldSpec::new("author__name", "a.name", FieldKind::Text),
];

pub static BOOK_SCHEMA: QuerySchema = QuerySchema {
    id_column: "b.id",
    fields: &BOOK_FIELDS,
    filter_fields: &["title", "publication_year", "author", "author__name"],
    search_fields: &["title", "author__name"],
    ordering_fields: &["title", "publication_year", "id"],
    default_ordering: &["title"],
};

/// `/api/books`
pub struct Books;

impl Resource for Books {
    type Entity = Book;
    type Input = BookInput;
    type Draft = BookDraft;

    const KIND: EntityKind = EntityKind::Book;

    fn schema() -> &'static QuerySchema {
        &BOOK_SCHEMA
    }

    fn id(entity: &Book) -> i64 {
        entity.id
    }

    fn build_draft(
        input: &BookInput,
        mode: WriteMode<'_, Book>,
        _author: &Principal,
        ctx: &ValidationContext,
        errors: &mut FieldErrors,
    ) -> Option<BookDraft> {
        if let Some(title) = &input.title {
            check_not_blank(errors, "title", title);
        }
        if let Some(year) = input.publication_year {
            check_publication_year(errors, year, ctx);
        }

        let title = mode.resolve(errors, "title", input.title.as_ref(), |b| b.title.clone());
        let publication_year = mode.resolve(
            errors,
            "publication_year",
            input.publication_year.as_ref(),
            |b| b.publication_year,
        );
        let author_id = mode.resolve(errors, "author", input.author.as_ref(), |b| b.author_id);

        Some(BookDraft {
            title: title?,
            publication_year: publication_year?,
            author_id: author_id?,
        })
    }

    fn references(draft: &BookDraft) -> Vec<Reference> {
        vec![Reference {
            field: "author",
            kind: EntityKind::Author,
            id: draft.author_id,
        }]
    }
}
