//! Read-only traversals across the library catalog.

use std::sync::Arc;

use serde_json::json;

use crate::domain::access::{Actor, AuthenticatedOrReadOnly, Authorizer, Operation};
use crate::domain::entities::{AUTHOR_SCHEMA, Author, BOOK_SCHEMA, Book, Librarian, Library};
use crate::domain::entities::{Authors, Books};
use crate::domain::query::ListQuery;
use crate::domain::repositories::{LibraryRepository, ResourceRepository};
use crate::error::AppError;

/// Follows catalog relationships starting from a named root record.
///
/// Every traversal fails with [`AppError::NotFound`] when the root does not
/// exist and returns an empty result when it exists without relations.
pub struct CatalogService<L: LibraryRepository + ?Sized> {
    authors: Arc<dyn ResourceRepository<Authors>>,
    books: Arc<dyn ResourceRepository<Books>>,
    libraries: Arc<L>,
}

impl<L: LibraryRepository + ?Sized> CatalogService<L> {
    pub fn new(
        authors: Arc<dyn ResourceRepository<Authors>>,
        books: Arc<dyn ResourceRepository<Books>>,
        libraries: Arc<L>,
    ) -> Self {
        Self {
            authors,
            books,
            libraries,
        }
    }

    /// Books written by the author with this exact name, ordered by title.
    ///
    /// When several authors share a name the one with the lowest id is used.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no author has this name.
    pub async fn books_by_author(&self, actor: &Actor, name: &str) -> Result<Vec<Book>, AppError> {
        authorize(actor)?;

        let author = self.find_author(name).await?;
        let query = ListQuery::new(&BOOK_SCHEMA).filter("author", &author.id.to_string());
        self.books.list(&query).await
    }

    /// Books held by the library with this name, ordered by title.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no library has this name.
    pub async fn books_in_library(&self, actor: &Actor, name: &str) -> Result<Vec<Book>, AppError> {
        authorize(actor)?;

        let library = self.find_library(name).await?;
        self.libraries.books_in_library(library.id).await
    }

    /// The librarian of the library with this name, if one is assigned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no library has this name.
    pub async fn librarian_for_library(
        &self,
        actor: &Actor,
        name: &str,
    ) -> Result<(Library, Option<Librarian>), AppError> {
        authorize(actor)?;

        let library = self.find_library(name).await?;
        let librarian = self.libraries.librarian_for(library.id).await?;
        Ok((library, librarian))
    }

    async fn find_author(&self, name: &str) -> Result<Author, AppError> {
        let query = ListQuery::new(&AUTHOR_SCHEMA)
            .filter("name", name)
            .order_by("id");

        self.authors
            .list(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::not_found("Author not found", json!({ "author": name }))
            })
    }

    async fn find_library(&self, name: &str) -> Result<Library, AppError> {
        self.libraries
            .find_library_by_name(name)
            .await?
            .ok_or_else(|| AppError::not_found("Library not found", json!({ "library": name })))
    }
}

fn authorize(actor: &Actor) -> Result<(), AppError> {
    AuthenticatedOrReadOnly.authorize(actor, Operation::List, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{AuthorDraft, BookDraft};
    use crate::domain::repositories::MockLibraryRepository;
    use crate::infrastructure::persistence::MemoryStore;

    async fn seed(store: &MemoryStore) -> (i64, i64) {
        let one = ResourceRepository::<Authors>::insert(
            store,
            AuthorDraft {
                name: "Author One".to_string(),
            },
        )
        .await
        .unwrap();
        let two = ResourceRepository::<Authors>::insert(
            store,
            AuthorDraft {
                name: "Author Two".to_string(),
            },
        )
        .await
        .unwrap();

        for (title, year, author_id) in [
            ("Beta Book", 2010, one.id),
            ("Alpha Book", 2000, one.id),
            ("Gamma Stories", 2005, two.id),
        ] {
            ResourceRepository::<Books>::insert(
                store,
                BookDraft {
                    title: title.to_string(),
                    publication_year: year,
                    author_id,
                },
            )
            .await
            .unwrap();
        }

        (one.id, two.id)
    }

    fn service(store: Arc<MemoryStore>) -> CatalogService<MemoryStore> {
        CatalogService::new(store.clone(), store.clone(), store)
    }

    #[tokio::test]
    async fn test_books_by_author() {
        let store = Arc::new(MemoryStore::new());
        seed(&store).await;

        let books = service(store)
            .books_by_author(&Actor::Anonymous, "Author One")
            .await
            .unwrap();

        let titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["Alpha Book", "Beta Book"]);
    }

    #[tokio::test]
    async fn test_author_without_books_yields_empty_list() {
        let store = Arc::new(MemoryStore::new());
        ResourceRepository::<Authors>::insert(
            &*store,
            AuthorDraft {
                name: "Quiet Author".to_string(),
            },
        )
        .await
        .unwrap();

        let books = service(store)
            .books_by_author(&Actor::Anonymous, "Quiet Author")
            .await
            .unwrap();
        assert!(books.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_author_is_not_found() {
        let store = Arc::new(MemoryStore::new());

        let err = service(store)
            .books_by_author(&Actor::Anonymous, "Nobody")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_books_in_library_and_librarian() {
        let store = Arc::new(MemoryStore::new());
        seed(&store).await;

        let library = store.create_library("Central").await.unwrap();
        store.add_book(library.id, 1).await.unwrap();
        store.add_book(library.id, 3).await.unwrap();
        store.add_book(library.id, 3).await.unwrap();

        let service = service(store.clone());

        let books = service
            .books_in_library(&Actor::Anonymous, "Central")
            .await
            .unwrap();
        assert_eq!(books.len(), 2);

        let (_, librarian) = service
            .librarian_for_library(&Actor::Anonymous, "Central")
            .await
            .unwrap();
        assert!(librarian.is_none());

        store.assign_librarian(library.id, "Ada").await.unwrap();
        let (found, librarian) = service
            .librarian_for_library(&Actor::Anonymous, "Central")
            .await
            .unwrap();
        assert_eq!(found.name, "Central");
        assert_eq!(librarian.unwrap().name, "Ada");
    }

    #[tokio::test]
    async fn test_unknown_library_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let mut libraries = MockLibraryRepository::new();
        libraries
            .expect_find_library_by_name()
            .times(2)
            .returning(|_| Ok(None));
        libraries.expect_books_in_library().never();
        libraries.expect_librarian_for().never();

        let service = CatalogService::new(store.clone(), store, Arc::new(libraries));

        assert!(matches!(
            service.books_in_library(&Actor::Anonymous, "Nowhere").await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            service
                .librarian_for_library(&Actor::Anonymous, "Nowhere")
                .await,
            Err(AppError::NotFound { .. })
        ));
    }
}
