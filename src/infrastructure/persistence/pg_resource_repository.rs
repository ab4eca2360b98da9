//! PostgreSQL implementation of the resource repository.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::domain::entities::{
    Author, AuthorDraft, Authors, Book, BookDraft, Books, Comment, CommentDraft, Comments, Post,
    PostDraft, Posts,
};
use crate::domain::query::ListQuery;
use crate::domain::repositories::ResourceRepository;
use crate::domain::resource::{Reference, Resource};
use crate::error::AppError;
use crate::infrastructure::persistence::sql::push_list_clauses;

/// Table layout of a resource.
///
/// `SELECT` must alias the main table the way the resource's query schema
/// expects (`b` for books joined to `a` for authors, and so on).
pub trait PgResource: Resource {
    const SELECT: &'static str;

    fn from_row(row: &PgRow) -> Result<Self::Entity, sqlx::Error>;

    /// Pushes an `INSERT ... RETURNING` for the draft.
    fn push_insert(builder: &mut QueryBuilder<'_, Postgres>, draft: Self::Draft);

    /// Pushes an `UPDATE ... WHERE id = ... RETURNING` for the draft.
    fn push_update(builder: &mut QueryBuilder<'_, Postgres>, id: i64, draft: Self::Draft);
}

/// PostgreSQL repository for any [`PgResource`].
pub struct PgResourceRepository<R> {
    pool: Arc<PgPool>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: PgResource> PgResourceRepository<R> {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            _resource: PhantomData,
        }
    }
}

#[async_trait]
impl<R: PgResource> ResourceRepository<R> for PgResourceRepository<R> {
    async fn list(&self, query: &ListQuery) -> Result<Vec<R::Entity>, AppError> {
        if query.matches_nothing() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Postgres>::new(R::SELECT);
        push_list_clauses(&mut builder, query);

        let rows = builder.build().fetch_all(self.pool.as_ref()).await?;
        Ok(rows
            .iter()
            .map(R::from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<R::Entity>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(R::SELECT);
        builder
            .push(" WHERE ")
            .push(R::schema().id_column)
            .push(" = ")
            .push_bind(id);

        let row = builder.build().fetch_optional(self.pool.as_ref()).await?;
        Ok(row.as_ref().map(R::from_row).transpose()?)
    }

    async fn insert(&self, draft: R::Draft) -> Result<R::Entity, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("");
        R::push_insert(&mut builder, draft);

        let row = builder.build().fetch_one(self.pool.as_ref()).await?;
        Ok(R::from_row(&row)?)
    }

    async fn replace(&self, id: i64, draft: R::Draft) -> Result<Option<R::Entity>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("");
        R::push_update(&mut builder, id, draft);

        let row = builder.build().fetch_optional(self.pool.as_ref()).await?;
        Ok(row.as_ref().map(R::from_row).transpose()?)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", R::KIND.table());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn reference_exists(&self, reference: &Reference) -> Result<bool, AppError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            reference.kind.table()
        );
        let exists = sqlx::query_scalar::<_, bool>(&sql)
            .bind(reference.id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(exists)
    }
}

/// Books of the author row aliased `a`, as a JSON array ordered like the
/// books list.
macro_rules! author_books {
    () => {
        "COALESCE((SELECT json_agg(json_build_object(\
        'id', b.id, 'title', b.title, 'publication_year', b.publication_year, 'author', b.author_id) \
        ORDER BY lower(b.title), b.title, b.id) FROM books b WHERE b.author_id = a.id), '[]'::json) AS books"
    };
}

impl PgResource for Authors {
    const SELECT: &'static str = concat!("SELECT a.id, a.name, ", author_books!(), " FROM authors a");

    fn from_row(row: &PgRow) -> Result<Author, sqlx::Error> {
        let Json(books) = row.try_get::<Json<Vec<Book>>, _>("books")?;
        Ok(Author {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            books,
        })
    }

    fn push_insert(builder: &mut QueryBuilder<'_, Postgres>, draft: AuthorDraft) {
        builder
            .push("INSERT INTO authors AS a (name) VALUES (")
            .push_bind(draft.name)
            .push(") RETURNING a.id, a.name, ")
            .push(author_books!());
    }

    fn push_update(builder: &mut QueryBuilder<'_, Postgres>, id: i64, draft: AuthorDraft) {
        builder
            .push("UPDATE authors AS a SET name = ")
            .push_bind(draft.name)
            .push(" WHERE a.id = ")
            .push_bind(id)
            .push(" RETURNING a.id, a.name, ")
            .push(author_books!());
    }
}

impl PgResource for Books {
    const SELECT: &'static str = "SELECT b.id, b.title, b.publication_year, b.author_id \
        FROM books b JOIN authors a ON a.id = b.author_id";

    fn from_row(row: &PgRow) -> Result<Book, sqlx::Error> {
        Ok(Book {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            publication_year: row.try_get("publication_year")?,
            author_id: row.try_get("author_id")?,
        })
    }

    fn push_insert(builder: &mut QueryBuilder<'_, Postgres>, draft: BookDraft) {
        builder
            .push("INSERT INTO books (title, publication_year, author_id) VALUES (")
            .push_bind(draft.title)
            .push(", ")
            .push_bind(draft.publication_year)
            .push(", ")
            .push_bind(draft.author_id)
            .push(") RETURNING id, title, publication_year, author_id");
    }

    fn push_update(builder: &mut QueryBuilder<'_, Postgres>, id: i64, draft: BookDraft) {
        builder
            .push("UPDATE books SET title = ")
            .push_bind(draft.title)
            .push(", publication_year = ")
            .push_bind(draft.publication_year)
            .push(", author_id = ")
            .push_bind(draft.author_id)
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING id, title, publication_year, author_id");
    }
}

const POST_COLUMNS: &str = "id, title, content, author_id, created_at, updated_at";

impl PgResource for Posts {
    const SELECT: &'static str = "SELECT p.id, p.title, p.content, p.author_id, \
        p.created_at, p.updated_at FROM posts p";

    fn from_row(row: &PgRow) -> Result<Post, sqlx::Error> {
        Ok(Post {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            author_id: row.try_get("author_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn push_insert(builder: &mut QueryBuilder<'_, Postgres>, draft: PostDraft) {
        builder
            .push("INSERT INTO posts (title, content, author_id) VALUES (")
            .push_bind(draft.title)
            .push(", ")
            .push_bind(draft.content)
            .push(", ")
            .push_bind(draft.author_id)
            .push(") RETURNING ")
            .push(POST_COLUMNS);
    }

    fn push_update(builder: &mut QueryBuilder<'_, Postgres>, id: i64, draft: PostDraft) {
        builder
            .push("UPDATE posts SET title = ")
            .push_bind(draft.title)
            .push(", content = ")
            .push_bind(draft.content)
            .push(", updated_at = clock_timestamp() WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(POST_COLUMNS);
    }
}

const COMMENT_COLUMNS: &str = "id, content, post_id, author_id, created_at, updated_at";

impl PgResource for Comments {
    const SELECT: &'static str = "SELECT c.id, c.content, c.post_id, c.author_id, \
        c.created_at, c.updated_at FROM comments c";

    fn from_row(row: &PgRow) -> Result<Comment, sqlx::Error> {
        Ok(Comment {
            id: row.try_get("id")?,
            content: row.try_get("content")?,
            post_id: row.try_get("post_id")?,
            author_id: row.try_get("author_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn push_insert(builder: &mut QueryBuilder<'_, Postgres>, draft: CommentDraft) {
        builder
            .push("INSERT INTO comments (content, post_id, author_id) VALUES (")
            .push_bind(draft.content)
            .push(", ")
            .push_bind(draft.post_id)
            .push(", ")
            .push_bind(draft.author_id)
            .push(") RETURNING ")
            .push(COMMENT_COLUMNS);
    }

    fn push_update(builder: &mut QueryBuilder<'_, Postgres>, id: i64, draft: CommentDraft) {
        builder
            .push("UPDATE comments SET content = ")
            .push_bind(draft.content)
            .push(", post_id = ")
            .push_bind(draft.post_id)
            .push(", updated_at = clock_timestamp() WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(COMMENT_COLUMNS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_insert_sql() {
        let mut builder = QueryBuilder::<Postgres>::new("");
        Books::push_insert(
            &mut builder,
            BookDraft {
                title: "Alpha Book".to_string(),
                publication_year: 2000,
                author_id: 1,
            },
        );
        assert_eq!(
            builder.sql(),
            "INSERT INTO books (title, publication_year, author_id) VALUES ($1, $2, $3) \
             RETURNING id, title, publication_year, author_id"
        );
    }

    #[test]
    fn test_post_update_keeps_author() {
        let mut builder = QueryBuilder::<Postgres>::new("");
        Posts::push_update(
            &mut builder,
            4,
            PostDraft {
                title: "t".to_string(),
                content: "c".to_string(),
                author_id: 9,
            },
        );
        let sql = builder.sql();
        assert!(sql.starts_with("UPDATE posts SET title = $1, content = $2"));
        assert!(!sql.contains("author_id ="));
    }
}
