//! PostgreSQL implementation of library repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Book, Books, Librarian, Library};
use crate::domain::repositories::LibraryRepository;
use crate::error::AppError;
use crate::infrastructure::persistence::pg_resource_repository::PgResource;

#[derive(sqlx::FromRow)]
struct LibraryRow {
    id: i64,
    name: String,
}

impl From<LibraryRow> for Library {
    fn from(row: LibraryRow) -> Self {
        Library {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LibrarianRow {
    id: i64,
    name: String,
    library_id: i64,
}

impl From<LibrarianRow> for Librarian {
    fn from(row: LibrarianRow) -> Self {
        Librarian {
            id: row.id,
            name: row.name,
            library_id: row.library_id,
        }
    }
}

/// PostgreSQL repository for libraries, their holdings and librarians.
pub struct PgLibraryRepository {
    pool: Arc<PgPool>,
}

impl PgLibraryRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LibraryRepository for PgLibraryRepository {
    async fn create_library(&self, name: &str) -> Result<Library, AppError> {
        let row = sqlx::query_as::<_, LibraryRow>(
            "INSERT INTO libraries (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_library_by_name(&self, name: &str) -> Result<Option<Library>, AppError> {
        let row = sqlx::query_as::<_, LibraryRow>(
            "SELECT id, name FROM libraries WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Library::from))
    }

    async fn list_libraries(&self) -> Result<Vec<Library>, AppError> {
        let rows =
            sqlx::query_as::<_, LibraryRow>("SELECT id, name FROM libraries ORDER BY lower(name), name, id")
                .fetch_all(self.pool.as_ref())
                .await?;

        Ok(rows.into_iter().map(Library::from).collect())
    }

    async fn add_book(&self, library_id: i64, book_id: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO library_books (library_id, book_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(library_id)
        .bind(book_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn books_in_library(&self, library_id: i64) -> Result<Vec<Book>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.title, b.publication_year, b.author_id
            FROM books b
            JOIN library_books lb ON lb.book_id = b.id
            WHERE lb.library_id = $1
            ORDER BY lower(b.title), b.title, b.id
            "#,
        )
        .bind(library_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .iter()
            .map(Books::from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn assign_librarian(&self, library_id: i64, name: &str) -> Result<Librarian, AppError> {
        let row = sqlx::query_as::<_, LibrarianRow>(
            r#"
            INSERT INTO librarians (library_id, name)
            VALUES ($1, $2)
            ON CONFLICT (library_id) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, library_id
            "#,
        )
        .bind(library_id)
        .bind(name)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn librarian_for(&self, library_id: i64) -> Result<Option<Librarian>, AppError> {
        let row = sqlx::query_as::<_, LibrarianRow>(
            "SELECT id, name, library_id FROM librarians WHERE library_id = $1",
        )
        .bind(library_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Librarian::from))
    }
}
