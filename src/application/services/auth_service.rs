//! Bearer token authentication and credential hashing.

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use std::sync::Arc;

use crate::domain::access::Actor;
use crate::domain::repositories::{TokenRepository, UserRepository};
use crate::error::AppError;
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const TOKEN_LEN: usize = 48;
const SALT_LEN: usize = 16;

/// Resolves bearer tokens to the user they were issued to.
///
/// Tokens are hashed with HMAC-SHA256 (keyed by `signing_secret`) before
/// storage and comparison, so the database alone cannot verify or forge them.
pub struct AuthService<T: TokenRepository + ?Sized, U: UserRepository + ?Sized> {
    tokens: Arc<T>,
    users: Arc<U>,
    signing_secret: String,
}

impl<T: TokenRepository + ?Sized, U: UserRepository + ?Sized> AuthService<T, U> {
    /// Creates a new authentication service.
    ///
    /// `signing_secret` must match the value used when tokens were issued.
    pub fn new(tokens: Arc<T>, users: Arc<U>, signing_secret: String) -> Self {
        Self {
            tokens,
            users,
            signing_secret,
        }
    }

    /// Authenticates a raw token and returns the acting user.
    ///
    /// On success the token's `last_used_at` is refreshed; a failure to do so
    /// is logged and does not fail the request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is unknown or revoked,
    /// or its user no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<Actor, AppError> {
        let token_hash = hash_token(&self.signing_secret, token);

        let api_token = self
            .tokens
            .find_active(&token_hash)
            .await?
            .ok_or_else(invalid_token)?;

        let user = self
            .users
            .find_by_id(api_token.user_id)
            .await?
            .ok_or_else(invalid_token)?;

        if let Err(e) = self.tokens.update_last_used(&token_hash).await {
            tracing::warn!(token_id = api_token.id, error = %e, "Failed to record token use");
        }

        Ok(Actor::User(user.to_principal()))
    }
}

fn invalid_token() -> AppError {
    AppError::unauthorized(
        "Invalid token.",
        json!({ "reason": "Invalid or revoked token" }),
    )
}

/// Hashes a raw token with HMAC-SHA256 keyed by `secret`.
///
/// Returns a 64-character lowercase hex-encoded MAC.
pub fn hash_token(secret: &str, token: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Generates a random 48-character alphanumeric token.
pub fn generate_token() -> String {
    random_string(TOKEN_LEN)
}

/// Hashes a password as `salt$mac` where `mac` is the HMAC of salt and password.
pub fn hash_password(secret: &str, password: &str) -> String {
    let salt = random_string(SALT_LEN);
    format!("{salt}${}", salted_mac(secret, &salt, password))
}

fn salted_mac(secret: &str, salt: &str, password: &str) -> String {
    hash_token(secret, &format!("{salt}:{password}"))
}

fn random_string(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::Capability;
    use crate::domain::entities::User;
    use crate::domain::repositories::{ApiToken, MockTokenRepository, MockUserRepository};
    use chrono::Utc;

    fn test_secret() -> String {
        "test-signing-secret".to_string()
    }

    fn api_token(user_id: i64) -> ApiToken {
        ApiToken {
            id: 1,
            user_id,
            name: "cli".to_string(),
            token_hash: String::new(),
            created_at: Utc::now(),
            last_used_at: None,
            revoked_at: None,
        }
    }

    fn user(id: i64) -> User {
        User {
            id,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            bio: String::new(),
            is_superuser: false,
            capabilities: [Capability::CanView].into_iter().collect(),
            following: Default::default(),
            date_joined: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut tokens = MockTokenRepository::new();
        let mut users = MockUserRepository::new();

        let expected_hash = hash_token(&test_secret(), "valid-token");
        tokens
            .expect_find_active()
            .withf(move |hash| hash == &expected_hash)
            .times(1)
            .returning(|_| Ok(Some(api_token(7))));
        tokens
            .expect_update_last_used()
            .times(1)
            .returning(|_| Ok(()));
        users
            .expect_find_by_id()
            .withf(|id| *id == 7)
            .times(1)
            .returning(|id| Ok(Some(user(id))));

        let service = AuthService::new(Arc::new(tokens), Arc::new(users), test_secret());

        let actor = service.authenticate("valid-token").await.unwrap();
        let principal = actor.principal().unwrap();
        assert_eq!(principal.id, 7);
        assert!(principal.has(Capability::CanView));
    }

    #[tokio::test]
    async fn test_authenticate_invalid_token() {
        let mut tokens = MockTokenRepository::new();
        let mut users = MockUserRepository::new();

        tokens.expect_find_active().times(1).returning(|_| Ok(None));
        users.expect_find_by_id().never();

        let service = AuthService::new(Arc::new(tokens), Arc::new(users), test_secret());

        let result = service.authenticate("invalid-token").await;
        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_authenticate_tolerates_last_used_failure() {
        let mut tokens = MockTokenRepository::new();
        let mut users = MockUserRepository::new();

        tokens
            .expect_find_active()
            .returning(|_| Ok(Some(api_token(3))));
        tokens
            .expect_update_last_used()
            .returning(|_| Err(AppError::internal("down", json!({}))));
        users
            .expect_find_by_id()
            .returning(|id| Ok(Some(user(id))));

        let service = AuthService::new(Arc::new(tokens), Arc::new(users), test_secret());

        assert!(service.authenticate("token").await.is_ok());
    }

    #[test]
    fn test_hash_token_consistency() {
        let hash1 = hash_token(&test_secret(), "test-token");
        let hash2 = hash_token(&test_secret(), "test-token");

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, hash_token(&test_secret(), "other-token"));
    }

    #[test]
    fn test_hash_token_secret_matters() {
        assert_ne!(hash_token("secret-a", "token"), hash_token("secret-b", "token"));
    }

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 48);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_password_hash_is_salted() {
        let stored = hash_password(&test_secret(), "hunter2");

        let (salt, mac) = stored.split_once('$').unwrap();
        assert_eq!(mac, salted_mac(&test_secret(), salt, "hunter2"));
        assert_ne!(mac, salted_mac(&test_secret(), salt, "hunter3"));
        assert_ne!(stored, hash_password(&test_secret(), "hunter2"));
    }
}
