//! Post entity and its resource definition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::access::{Owned, Principal};
use crate::domain::query::{FieldKind, FieldSpec, FieldValue, QuerySchema, Queryable};
use crate::domain::resource::{EntityKind, Resource, WriteMode};
use crate::domain::validation::{FieldErrors, ValidationContext, check_not_blank};

/// A post owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(rename = "author")]
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Post {
    fn owner_id(&self) -> Option<i64> {
        Some(self.author_id)
    }
}

impl Queryable for Post {
    fn id(&self) -> i64 {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(FieldValue::Integer(self.id)),
            "title" => Some(FieldValue::Text(self.title.clone())),
            "content" => Some(FieldValue::Text(self.content.clone())),
            "author" => Some(FieldValue::Integer(self.author_id)),
            "created_at" => Some(FieldValue::Timestamp(self.created_at)),
            "updated_at" => Some(FieldValue::Timestamp(self.updated_at)),
            _ => None,
        }
    }
}

/// The author is always the requesting user and cannot be written.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PostInput {
    #[validate(length(max = 200, message = "Ensure this field has no more than 200 characters."))]
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub author_id: i64,
}

static POST_FIELDS: [FieldSpec; 6] = [
    FieldSpec::new("id", "p.id", FieldKind::Integer),
    FieldSpec::new("title", "p.title", FieldKind::Text),
    FieldSpec::new("content", "p.content", FieldKind::Text),
    FieldSpec::new("author", "p.author_id", FieldKind::Integer),
    FieldSpec::new("created_at", "p.created_at", FieldKind::Timestamp),
    FieldSpec::new("updated_at", "p.updated_at", FieldKind::Timestamp),
];

pub static POST_SCHEMA: QuerySchema = QuerySchema {
    id_column: "p.id",
    fields: &POST_FIELDS,
    filter_fields: &["author"],
    search_fields: &["title", "content"],
    ordering_fields: &["created_at", "updated_at"],
    default_ordering: &["-created_at"],
};

/// `/api/posts`
pub struct Posts;

impl Resource for Posts {
    type Entity = Post;
    type Input = PostInput;
    type Draft = PostDraft;

    const KIND: EntityKind = EntityKind::Post;

    fn schema() -> &'static QuerySchema {
        &POST_SCHEMA
    }

    fn id(entity: &Post) -> i64 {
        entity.id
    }

    fn build_draft(
        input: &PostInput,
        mode: WriteMode<'_, Post>,
        author: &Principal,
        _ctx: &ValidationContext,
        errors: &mut FieldErrors,
    ) -> Option<PostDraft> {
        if let Some(title) = &input.title {
            check_not_blank(errors, "title", title);
        }
        if let Some(content) = &input.content {
            check_not_blank(errors, "content", content);
        }

        let title = mode.resolve(errors, "title", input.title.as_ref(), |p| p.title.clone());
        let content = mode.resolve(errors, "content", input.content.as_ref(), |p| {
            p.content.clone()
        });
        let author_id = mode.existing().map_or(author.id, |p| p.author_id);

        Some(PostDraft {
            title: title?,
            content: content?,
            author_id,
        })
    }
}
