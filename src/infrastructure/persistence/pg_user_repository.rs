//! PostgreSQL implementation of user repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::access::Capability;
use crate::domain::entities::{NewUser, ProfileUpdate, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

const USER_SELECT: &str = r#"
    SELECT
        u.id, u.username, u.email, u.password_hash, u.bio, u.is_superuser, u.date_joined,
        ARRAY(
            SELECT c.capability FROM user_capabilities c
            WHERE c.user_id = u.id ORDER BY c.capability
        ) AS capabilities,
        ARRAY(
            SELECT f.following_id FROM user_following f
            WHERE f.user_id = u.id ORDER BY f.following_id
        ) AS following
    FROM users u
"#;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    bio: String,
    is_superuser: bool,
    date_joined: DateTime<Utc>,
    capabilities: Vec<String>,
    following: Vec<i64>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let capabilities = row
            .capabilities
            .iter()
            .filter_map(|c| match c.parse::<Capability>() {
                Ok(capability) => Some(capability),
                Err(e) => {
                    tracing::warn!(user_id = row.id, error = %e, "Skipping stored capability");
                    None
                }
            })
            .collect();

        User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            bio: row.bio,
            is_superuser: row.is_superuser,
            capabilities,
            following: row.following.into_iter().collect(),
            date_joined: row.date_joined,
        }
    }
}

/// PostgreSQL repository for accounts, capabilities and the following graph.
pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: i64) -> Result<bool, AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool.as_ref())
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (username, email, password_hash, is_superuser)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.is_superuser)
        .fetch_one(self.pool.as_ref())
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("Created user vanished", serde_json::json!({ "id": id })))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} WHERE u.username = $1"))
            .bind(username)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(User::from))
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} ORDER BY u.id"))
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update_profile(
        &self,
        id: i64,
        update: ProfileUpdate,
    ) -> Result<Option<User>, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                bio = COALESCE($3, bio)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.email)
        .bind(update.bio)
        .execute(self.pool.as_ref())
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn follow(&self, user_id: i64, target_id: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_following (user_id, following_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(target_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn unfollow(&self, user_id: i64, target_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_following WHERE user_id = $1 AND following_id = $2")
            .bind(user_id)
            .bind(target_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn set_capability(
        &self,
        user_id: i64,
        capability: Capability,
        granted: bool,
    ) -> Result<bool, AppError> {
        if !self.exists(user_id).await? {
            return Ok(false);
        }

        let sql = if granted {
            "INSERT INTO user_capabilities (user_id, capability) VALUES ($1, $2) ON CONFLICT DO NOTHING"
        } else {
            "DELETE FROM user_capabilities WHERE user_id = $1 AND capability = $2"
        };
        sqlx::query(sql)
            .bind(user_id)
            .bind(capability.as_str())
            .execute(self.pool.as_ref())
            .await?;

        Ok(true)
    }
}
