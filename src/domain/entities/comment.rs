//! Comment entity and its resource definition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::access::{Owned, Principal};
use crate::domain::query::{FieldKind, FieldSpec, FieldValue, QuerySchema, Queryable};
use crate::domain::resource::{EntityKind, Reference, Resource, WriteMode};
use crate::domain::validation::{FieldErrors, ValidationContext, check_not_blank};

/// A comment on a post. Deleted together with its post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    #[serde(rename = "post")]
    pub post_id: i64,
    #[serde(rename = "author")]
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Comment {
    fn owner_id(&self) -> Option<i64> {
        Some(self.author_id)
    }
}

impl Queryable for Comment {
    fn id(&self) -> i64 {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(FieldValue::Integer(self.id)),
            "content" => Some(FieldValue::Text(self.content.clone())),
            "post" => Some(FieldValue::Integer(self.post_id)),
            "author" => Some(FieldValue::Integer(self.author_id)),
            "created_at" => Some(FieldValue::Timestamp(self.created_at)),
            "updated_at" => Some(FieldValue::Timestamp(self.updated_at)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CommentInput {
    pub content: Option<String>,
    pub post: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub content: String,
    pub post_id: i64,
    pub author_id: i64,
}

static COMMENT_FIELDS: [FieldSpec; 6] = [
    FieldSpec::new("id", "c.id", FieldKind::Integer),
    FieldSpec::new("content", "c.content", FieldKind::Text),
    FieldSpec::new("post", "c.post_id", FieldKind::Integer),
    FieldSpec::new("author", "c.author_id", FieldKind::Integer),
    FieldSpec::new("created_at", "c.created_at", FieldKind::Timestamp),
    FieldSpec::new("updated_at", "c.updated_at", FieldKind::Timestamp),
];

pub static COMMENT_SCHEMA: QuerySchema = QuerySchema {
    id_column: "c.id",
    fields: &COMMENT_FIELDS,
    filter_fields: &["post", "author"],
    search_fields: &[],
    ordering_fields: &["created_at", "updated_at"],
    default_ordering: &["-created_at"],
};

/// `/api/comments`
pub struct Comments;

impl Resource for Comments {
    type Entity = Comment;
    type Input = CommentInput;
    type Draft = CommentDraft;

    const KIND: EntityKind = EntityKind::Comment;

    fn schema() -> &'static QuerySchema {
        &COMMENT_SCHEMA
    }

    fn id(entity: &Comment) -> i64 {
        entity.id
    }

    fn build_draft(
        input: &CommentInput,
        mode: WriteMode<'_, Comment>,
        author: &Principal,
        _ctx: &ValidationContext,
        errors: &mut FieldErrors,
    ) -> Option<CommentDraft> {
        if let Some(content) = &input.content {
            check_not_blank(errors, "content", content);
        }

        let content = mode.resolve(errors, "content", input.content.as_ref(), |c| {
            c.content.clone()
        });
        let post_id = mode.resolve(errors, "post", input.post.as_ref(), |c| c.post_id);
        let author_id = mode.existing().map_or(author.id, |c| c.author_id);

        Some(CommentDraft {
            content: content?,
            post_id: post_id?,
            author_id,
        })
    }

    fn references(draft: &CommentDraft) -> Vec<Reference> {
        vec![Reference {
            field: "post",
            kind: EntityKind::Post,
            id: draft.post_id,
        }]
    }
}
