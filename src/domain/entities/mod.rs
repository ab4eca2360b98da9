//! Core domain entities representing the business data model.
//!
//! Entities are plain data records. Resource-backed entities (authors, books,
//! posts, comments) sit next to their write payload (`*Input`), their
//! validated draft (`*Draft`), their list-query schema and the marker type
//! implementing [`crate::domain::resource::Resource`].
//!
//! # Entity Types
//!
//! - [`Author`], [`Book`] - the catalog
//! - [`Library`], [`Librarian`] - catalog holdings
//! - [`User`] - accounts and the following graph
//! - [`Post`], [`Comment`] - social content

pub mod author;
pub mod book;
pub mod comment;
pub mod library;
pub mod post;
pub mod user;

pub use author::{AUTHOR_SCHEMA, Author, AuthorDraft, AuthorInput, Authors};
pub use book::{BOOK_SCHEMA, Book, BookDraft, BookInput, BookRow, Books};
pub use comment::{COMMENT_SCHEMA, Comment, CommentDraft, CommentInput, Comments};
pub use library::{Librarian, Library};
pub use post::{POST_SCHEMA, Post, PostDraft, PostInput, Posts};
pub use user::{NewUser, ProfileUpdate, User};
