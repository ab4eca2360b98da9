//! In-process store implementing every repository trait.
//!
//! Used when no database is configured and by the test suite. Foreign keys,
//! unique constraints and cascades mirror `migrations/0001_init.sql`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::json;
use tokio::sync::RwLock;

use crate::domain::access::Capability;
use crate::domain::entities::{
    Author, AuthorDraft, Authors, Book, BookDraft, BookRow, Books, Comment, CommentDraft,
    Comments, Librarian, Library, NewUser, Post, PostDraft, Posts, ProfileUpdate, User,
};
use crate::domain::query::{ListQuery, text_order};
use crate::domain::repositories::{
    ApiToken, LibraryRepository, ResourceRepository, StoreHealth, TokenRepository, UserRepository,
};
use crate::domain::resource::{EntityKind, Reference};
use crate::error::AppError;

#[derive(Default)]
struct Tables {
    authors: BTreeMap<i64, Author>,
    books: BTreeMap<i64, Book>,
    libraries: BTreeMap<i64, Library>,
    library_books: BTreeSet<(i64, i64)>,
    librarians: BTreeMap<i64, Librarian>,
    users: BTreeMap<i64, User>,
    tokens: BTreeMap<i64, ApiToken>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    sequences: HashMap<&'static str, i64>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Tables {
    fn next_id(&mut self, table: &'static str) -> i64 {
        let id = self.sequences.entry(table).or_insert(0);
        *id += 1;
        *id
    }

    /// Wall-clock time, nudged forward so consecutive writes never share a timestamp.
    fn now(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let now = match self.last_timestamp {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(now);
        now
    }

    fn exists(&self, kind: EntityKind, id: i64) -> bool {
        match kind {
            EntityKind::Author => self.authors.contains_key(&id),
            EntityKind::Book => self.books.contains_key(&id),
            EntityKind::Library => self.libraries.contains_key(&id),
            EntityKind::Librarian => self.librarians.contains_key(&id),
            EntityKind::User => self.users.contains_key(&id),
            EntityKind::Post => self.posts.contains_key(&id),
            EntityKind::Comment => self.comments.contains_key(&id),
        }
    }

    fn require(&self, kind: EntityKind, id: i64) -> Result<(), AppError> {
        if self.exists(kind, id) {
            Ok(())
        } else {
            Err(AppError::bad_request("Referenced record does not exist"))
        }
    }

    fn with_books(&self, author: &Author) -> Author {
        let mut books: Vec<Book> = self
            .books
            .values()
            .filter(|b| b.author_id == author.id)
            .cloned()
            .collect();
        sort_books(&mut books);
        Author {
            books,
            ..author.clone()
        }
    }

    fn delete_books(&mut self, ids: &[i64]) {
        for id in ids {
            self.books.remove(id);
        }
        self.library_books.retain(|(_, book_id)| !ids.contains(book_id));
    }

    fn delete_posts(&mut self, ids: &[i64]) {
        for id in ids {
            self.posts.remove(id);
        }
        self.comments.retain(|_, c| !ids.contains(&c.post_id));
    }
}

/// Thread-safe in-memory database.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_books(books: &mut [Book]) {
    books.sort_by(|a, b| text_order(&a.title, &b.title).then(a.id.cmp(&b.id)));
}

fn conflict(constraint: &str) -> AppError {
    AppError::conflict(
        "Unique constraint violation",
        json!({ "constraint": constraint }),
    )
}

#[async_trait]
impl ResourceRepository<Authors> for MemoryStore {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Author>, AppError> {
        let tables = self.tables.read().await;
        let authors = query.apply(tables.authors.values().cloned().collect());
        Ok(authors.iter().map(|a| tables.with_books(a)).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Author>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.authors.get(&id).map(|a| tables.with_books(a)))
    }

    async fn insert(&self, draft: AuthorDraft) -> Result<Author, AppError> {
        let mut tables = self.tables.write().await;
        let author = Author {
            id: tables.next_id("authors"),
            name: draft.name,
            books: Vec::new(),
        };
        tables.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn replace(&self, id: i64, draft: AuthorDraft) -> Result<Option<Author>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(author) = tables.authors.get_mut(&id) else {
            return Ok(None);
        };
        author.name = draft.name;
        let author = author.clone();
        Ok(Some(tables.with_books(&author)))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.authors.remove(&id).is_none() {
            return Ok(false);
        }
        let books: Vec<i64> = tables
            .books
            .values()
            .filter(|b| b.author_id == id)
            .map(|b| b.id)
            .collect();
        tables.delete_books(&books);
        Ok(true)
    }

    async fn reference_exists(&self, reference: &Reference) -> Result<bool, AppError> {
        Ok(self.tables.read().await.exists(reference.kind, reference.id))
    }
}

#[async_trait]
impl ResourceRepository<Books> for MemoryStore {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Book>, AppError> {
        let tables = self.tables.read().await;
        let rows = tables
            .books
            .values()
            .map(|book| BookRow {
                book: book.clone(),
                author_name: tables
                    .authors
                    .get(&book.author_id)
                    .map(|a| a.name.clone())
                    .unwrap_or_default(),
            })
            .collect();

        Ok(query.apply(rows).into_iter().map(|row| row.book).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, AppError> {
        Ok(self.tables.read().await.books.get(&id).cloned())
    }

    async fn insert(&self, draft: BookDraft) -> Result<Book, AppError> {
        let mut tables = self.tables.write().await;
        tables.require(EntityKind::Author, draft.author_id)?;

        let book = Book {
            id: tables.next_id("books"),
            title: draft.title,
            publication_year: draft.publication_year,
            author_id: draft.author_id,
        };
        tables.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn replace(&self, id: i64, draft: BookDraft) -> Result<Option<Book>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.books.contains_key(&id) {
            return Ok(None);
        }
        tables.require(EntityKind::Author, draft.author_id)?;

        Ok(tables.books.get_mut(&id).map(|book| {
            book.title = draft.title;
            book.publication_year = draft.publication_year;
            book.author_id = draft.author_id;
            book.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.books.contains_key(&id) {
            return Ok(false);
        }
        tables.delete_books(&[id]);
        Ok(true)
    }

    async fn reference_exists(&self, reference: &Reference) -> Result<bool, AppError> {
        Ok(self.tables.read().await.exists(reference.kind, reference.id))
    }
}

#[async_trait]
impl ResourceRepository<Posts> for MemoryStore {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Post>, AppError> {
        let tables = self.tables.read().await;
        Ok(query.apply(tables.posts.values().cloned().collect()))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, AppError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn insert(&self, draft: PostDraft) -> Result<Post, AppError> {
        let mut tables = self.tables.write().await;
        let now = tables.now();
        let post = Post {
            id: tables.next_id("posts"),
            title: draft.title,
            content: draft.content,
            author_id: draft.author_id,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn replace(&self, id: i64, draft: PostDraft) -> Result<Option<Post>, AppError> {
        let mut tables = self.tables.write().await;
        let now = tables.now();
        Ok(tables.posts.get_mut(&id).map(|post| {
            post.title = draft.title;
            post.content = draft.content;
            post.updated_at = now;
            post.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&id) {
            return Ok(false);
        }
        tables.delete_posts(&[id]);
        Ok(true)
    }

    async fn reference_exists(&self, reference: &Reference) -> Result<bool, AppError> {
        Ok(self.tables.read().await.exists(reference.kind, reference.id))
    }
}

#[async_trait]
impl ResourceRepository<Comments> for MemoryStore {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Comment>, AppError> {
        let tables = self.tables.read().await;
        Ok(query.apply(tables.comments.values().cloned().collect()))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, AppError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn insert(&self, draft: CommentDraft) -> Result<Comment, AppError> {
        let mut tables = self.tables.write().await;
        tables.require(EntityKind::Post, draft.post_id)?;

        let now = tables.now();
        let comment = Comment {
            id: tables.next_id("comments"),
            content: draft.content,
            post_id: draft.post_id,
            author_id: draft.author_id,
            created_at: now,
            updated_at: now,
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn replace(&self, id: i64, draft: CommentDraft) -> Result<Option<Comment>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.comments.contains_key(&id) {
            return Ok(None);
        }
        tables.require(EntityKind::Post, draft.post_id)?;

        let now = tables.now();
        Ok(tables.comments.get_mut(&id).map(|comment| {
            comment.content = draft.content;
            comment.post_id = draft.post_id;
            comment.updated_at = now;
            comment.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.write().await.comments.remove(&id).is_some())
    }

    async fn reference_exists(&self, reference: &Reference) -> Result<bool, AppError> {
        Ok(self.tables.read().await.exists(reference.kind, reference.id))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.username == new_user.username)
        {
            return Err(conflict("users_username_key"));
        }

        let date_joined = tables.now();
        let user = User {
            id: tables.next_id("users"),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            bio: String::new(),
            is_superuser: new_user.is_superuser,
            capabilities: BTreeSet::new(),
            following: BTreeSet::new(),
            date_joined,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn update_profile(
        &self,
        id: i64,
        update: ProfileUpdate,
    ) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            if let Some(email) = update.email {
                user.email = email;
            }
            if let Some(bio) = update.bio {
                user.bio = bio;
            }
            user.clone()
        }))
    }

    async fn follow(&self, user_id: i64, target_id: i64) -> Result<(), AppError> {
        if user_id == target_id {
            return Err(AppError::bad_request("A user cannot follow itself"));
        }
        let mut tables = self.tables.write().await;
        tables.require(EntityKind::User, target_id)?;
        if let Some(user) = tables.users.get_mut(&user_id) {
            user.following.insert(target_id);
        }
        Ok(())
    }

    async fn unfollow(&self, user_id: i64, target_id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.get_mut(&user_id) {
            user.following.remove(&target_id);
        }
        Ok(())
    }

    async fn set_capability(
        &self,
        user_id: i64,
        capability: Capability,
        granted: bool,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.get_mut(&user_id) else {
            return Ok(false);
        };
        if granted {
            user.capabilities.insert(capability);
        } else {
            user.capabilities.remove(&capability);
        }
        Ok(true)
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn find_active(&self, token_hash: &str) -> Result<Option<ApiToken>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tokens
            .values()
            .find(|t| t.token_hash == token_hash && !t.is_revoked())
            .cloned())
    }

    async fn update_last_used(&self, token_hash: &str) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let now = tables.now();
        for token in tables.tokens.values_mut() {
            if token.token_hash == token_hash && !token.is_revoked() {
                token.last_used_at = Some(now);
            }
        }
        Ok(())
    }

    async fn create_token(
        &self,
        user_id: i64,
        name: &str,
        token_hash: &str,
    ) -> Result<ApiToken, AppError> {
        let mut tables = self.tables.write().await;
        tables.require(EntityKind::User, user_id)?;
        if tables.tokens.values().any(|t| t.token_hash == token_hash) {
            return Err(conflict("api_tokens_token_hash_key"));
        }

        let created_at = tables.now();
        let token = ApiToken {
            id: tables.next_id("api_tokens"),
            user_id,
            name: name.to_string(),
            token_hash: token_hash.to_string(),
            created_at,
            last_used_at: None,
            revoked_at: None,
        };
        tables.tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn list_tokens(&self) -> Result<Vec<ApiToken>, AppError> {
        let tables = self.tables.read().await;
        let mut tokens: Vec<ApiToken> = tables.tokens.values().cloned().collect();
        tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tokens)
    }

    async fn revoke_token(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let now = tables.now();
        match tables.tokens.get_mut(&id) {
            Some(token) if !token.is_revoked() => {
                token.revoked_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl LibraryRepository for MemoryStore {
    async fn create_library(&self, name: &str) -> Result<Library, AppError> {
        let mut tables = self.tables.write().await;
        if tables.libraries.values().any(|l| l.name == name) {
            return Err(conflict("libraries_name_key"));
        }
        let library = Library {
            id: tables.next_id("libraries"),
            name: name.to_string(),
        };
        tables.libraries.insert(library.id, library.clone());
        Ok(library)
    }

    async fn find_library_by_name(&self, name: &str) -> Result<Option<Library>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.libraries.values().find(|l| l.name == name).cloned())
    }

    async fn list_libraries(&self) -> Result<Vec<Library>, AppError> {
        let tables = self.tables.read().await;
        let mut libraries: Vec<Library> = tables.libraries.values().cloned().collect();
        libraries.sort_by(|a, b| text_order(&a.name, &b.name).then(a.id.cmp(&b.id)));
        Ok(libraries)
    }

    async fn add_book(&self, library_id: i64, book_id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        tables.require(EntityKind::Library, library_id)?;
        tables.require(EntityKind::Book, book_id)?;
        tables.library_books.insert((library_id, book_id));
        Ok(())
    }

    async fn books_in_library(&self, library_id: i64) -> Result<Vec<Book>, AppError> {
        let tables = self.tables.read().await;
        let mut books: Vec<Book> = tables
            .library_books
            .iter()
            .filter(|(lib, _)| *lib == library_id)
            .filter_map(|(_, book_id)| tables.books.get(book_id).cloned())
            .collect();
        sort_books(&mut books);
        Ok(books)
    }

    async fn assign_librarian(&self, library_id: i64, name: &str) -> Result<Librarian, AppError> {
        let mut tables = self.tables.write().await;
        tables.require(EntityKind::Library, library_id)?;

        let existing = tables
            .librarians
            .values()
            .find(|l| l.library_id == library_id)
            .map(|l| l.id);
        let id = match existing {
            Some(id) => id,
            None => tables.next_id("librarians"),
        };

        let librarian = Librarian {
            id,
            name: name.to_string(),
            library_id,
        };
        tables.librarians.insert(id, librarian.clone());
        Ok(librarian)
    }

    async fn librarian_for(&self, library_id: i64) -> Result<Option<Librarian>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .librarians
            .values()
            .find(|l| l.library_id == library_id)
            .cloned())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), AppError> {
        let _ = self.tables.read().await;
        Ok(())
    }
}
