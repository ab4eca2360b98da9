//! Following graph, feed and profile operations.

use std::sync::Arc;

use serde_json::json;
use validator::Validate;

use crate::domain::access::Actor;
use crate::domain::entities::{POST_SCHEMA, Post, Posts, ProfileUpdate, User};
use crate::domain::query::{FieldValue, ListQuery, Page};
use crate::domain::repositories::{ResourceRepository, UserRepository};
use crate::error::AppError;

/// Default number of posts per feed page.
pub const DEFAULT_FEED_PAGE_SIZE: u32 = 10;

/// Service for the user-to-user following relation and what it drives.
pub struct SocialService<U: UserRepository + ?Sized> {
    users: Arc<U>,
    posts: Arc<dyn ResourceRepository<Posts>>,
    feed_page_size: u32,
}

impl<U: UserRepository + ?Sized> SocialService<U> {
    pub fn new(
        users: Arc<U>,
        posts: Arc<dyn ResourceRepository<Posts>>,
        feed_page_size: u32,
    ) -> Self {
        Self {
            users,
            posts,
            feed_page_size,
        }
    }

    pub fn feed_page_size(&self) -> u32 {
        self.feed_page_size
    }

    /// Makes the actor follow `target_id`. Following twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for anonymous actors,
    /// [`AppError::InvalidOperation`] when `target_id` is the actor itself and
    /// [`AppError::NotFound`] for an unknown target.
    pub async fn follow(&self, actor: &Actor, target_id: i64) -> Result<User, AppError> {
        let principal = actor.require_authenticated()?;
        if principal.id == target_id {
            return Err(AppError::invalid_operation(
                "You cannot follow yourself.",
                json!({ "user_id": target_id }),
            ));
        }
        let target = self.load(target_id).await?;

        self.users.follow(principal.id, target.id).await?;
        tracing::info!(user_id = principal.id, target_id, "Followed user");

        Ok(target)
    }

    /// Makes the actor stop following `target_id`. Unfollowing a user that
    /// is not followed is a no-op.
    ///
    /// # Errors
    ///
    /// Same as [`Self::follow`].
    pub async fn unfollow(&self, actor: &Actor, target_id: i64) -> Result<User, AppError> {
        let principal = actor.require_authenticated()?;
        if principal.id == target_id {
            return Err(AppError::invalid_operation(
                "You cannot unfollow yourself.",
                json!({ "user_id": target_id }),
            ));
        }
        let target = self.load(target_id).await?;

        self.users.unfollow(principal.id, target.id).await?;
        tracing::info!(user_id = principal.id, target_id, "Unfollowed user");

        Ok(target)
    }

    /// Posts by users the actor follows, newest first. Pages start at 1.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for anonymous actors and
    /// [`AppError::Validation`] for page 0.
    pub async fn feed(&self, actor: &Actor, page: u32) -> Result<Vec<Post>, AppError> {
        let principal = actor.require_authenticated()?;
        let page = Page::new(page, self.feed_page_size)?;
        let user = self.load(principal.id).await?;

        let authors = user
            .following
            .iter()
            .map(|id| FieldValue::Integer(*id))
            .collect();
        let query = ListQuery::new(&POST_SCHEMA)
            .filter_any("author", authors)
            .order_by("-created_at")
            .paginate(page);

        self.posts.list(&query).await
    }

    /// The actor's own account.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for anonymous actors.
    pub async fn profile(&self, actor: &Actor) -> Result<User, AppError> {
        let principal = actor.require_authenticated()?;
        self.load(principal.id).await
    }

    /// Partially updates the actor's email and bio.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an invalid email or an overlong bio.
    pub async fn update_profile(
        &self,
        actor: &Actor,
        update: ProfileUpdate,
    ) -> Result<User, AppError> {
        let principal = actor.require_authenticated()?;
        update.validate()?;

        let user = self
            .users
            .update_profile(principal.id, update)
            .await?
            .ok_or_else(|| user_not_found(principal.id))?;

        tracing::info!(user_id = user.id, "Profile updated");
        Ok(user)
    }

    async fn load(&self, id: i64) -> Result<User, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| user_not_found(id))
    }
}

fn user_not_found(id: i64) -> AppError {
    AppError::not_found("User not found", json!({ "user_id": id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{NewUser, PostDraft};
    use crate::domain::repositories::MockUserRepository;
    use crate::infrastructure::persistence::MemoryStore;
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn actor(user: &User) -> Actor {
        Actor::User(user.to_principal())
    }

    fn test_user(id: i64) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: String::new(),
            bio: String::new(),
            is_superuser: false,
            capabilities: BTreeSet::new(),
            following: BTreeSet::new(),
            date_joined: Utc::now(),
        }
    }

    async fn create_user(store: &MemoryStore, username: &str) -> User {
        UserRepository::create(
            store,
            NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: String::new(),
                is_superuser: false,
            },
        )
        .await
        .unwrap()
    }

    fn service(store: Arc<MemoryStore>, page_size: u32) -> SocialService<MemoryStore> {
        SocialService::new(store.clone(), store, page_size)
    }

    #[tokio::test]
    async fn test_self_follow_is_invalid_and_leaves_set_unchanged() {
        let store = Arc::new(MemoryStore::new());
        let alice = create_user(&store, "alice").await;
        let service = service(store, DEFAULT_FEED_PAGE_SIZE);

        let err = service.follow(&actor(&alice), alice.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation { .. }));

        let profile = service.profile(&actor(&alice)).await.unwrap();
        assert!(profile.following.is_empty());
    }

    #[tokio::test]
    async fn test_follow_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let alice = create_user(&store, "alice").await;
        let bob = create_user(&store, "bob").await;
        let service = service(store, DEFAULT_FEED_PAGE_SIZE);

        service.follow(&actor(&alice), bob.id).await.unwrap();
        service.follow(&actor(&alice), bob.id).await.unwrap();

        let profile = service.profile(&actor(&alice)).await.unwrap();
        assert_eq!(profile.following.iter().copied().collect::<Vec<_>>(), [bob.id]);

        service.unfollow(&actor(&alice), bob.id).await.unwrap();
        service.unfollow(&actor(&alice), bob.id).await.unwrap();
        let profile = service.profile(&actor(&alice)).await.unwrap();
        assert!(profile.following.is_empty());
    }

    #[tokio::test]
    async fn test_follow_unknown_user_is_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().times(1).returning(|_| Ok(None));
        users.expect_follow().never();

        let store = Arc::new(MemoryStore::new());
        let service = SocialService::new(Arc::new(users), store, DEFAULT_FEED_PAGE_SIZE);

        let err = service
            .follow(&Actor::User(test_user(1).to_principal()), 99)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_anonymous_cannot_follow() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().never();

        let store = Arc::new(MemoryStore::new());
        let service = SocialService::new(Arc::new(users), store, DEFAULT_FEED_PAGE_SIZE);

        assert!(matches!(
            service.follow(&Actor::Anonymous, 2).await,
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_feed_is_newest_first_and_paginated() {
        let store = Arc::new(MemoryStore::new());
        let alice = create_user(&store, "alice").await;
        let bob = create_user(&store, "bob").await;
        let carol = create_user(&store, "carol").await;

        for (i, author) in [bob.id, carol.id, bob.id, alice.id].into_iter().enumerate() {
            ResourceRepository::<Posts>::insert(
                &*store,
                PostDraft {
                    title: format!("post {i}"),
                    content: "body".to_string(),
                    author_id: author,
                },
            )
            .await
            .unwrap();
        }

        let service = service(store, 2);
        service.follow(&actor(&alice), bob.id).await.unwrap();
        service.follow(&actor(&alice), carol.id).await.unwrap();

        let first = service.feed(&actor(&alice), 1).await.unwrap();
        let titles: Vec<_> = first.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["post 2", "post 1"]);

        let second = service.feed(&actor(&alice), 2).await.unwrap();
        let titles: Vec<_> = second.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["post 0"]);

        assert!(service.feed(&actor(&alice), 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_feed_without_following_is_empty() {
        let store = Arc::new(MemoryStore::new());
        let alice = create_user(&store, "alice").await;
        let service = service(store, DEFAULT_FEED_PAGE_SIZE);

        assert!(service.feed(&actor(&alice), 1).await.unwrap().is_empty());
        assert!(service.feed(&actor(&alice), 0).await.is_err());
    }

    #[tokio::test]
    async fn test_update_profile_validates() {
        let store = Arc::new(MemoryStore::new());
        let alice = create_user(&store, "alice").await;
        let service = service(store, DEFAULT_FEED_PAGE_SIZE);

        let err = service
            .update_profile(
                &actor(&alice),
                ProfileUpdate {
                    email: Some("broken".to_string()),
                    bio: None,
                },
            )
            .await
            .unwrap_err();
        assert!(err.field_errors().unwrap().contains("email"));

        let updated = service
            .update_profile(
                &actor(&alice),
                ProfileUpdate {
                    email: None,
                    bio: Some("Reader of books".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.bio, "Reader of books");
        assert_eq!(updated.email, "alice@example.com");
    }
}
