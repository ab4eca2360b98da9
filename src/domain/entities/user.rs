//! User accounts and the following graph.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::access::{Capability, Principal};

/// An account that can author posts and comments and follow other users.
///
/// `following` never contains the user's own id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub bio: String,
    pub is_superuser: bool,
    pub capabilities: BTreeSet<Capability>,
    pub following: BTreeSet<i64>,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// The identity this user presents to the authorization layer.
    pub fn to_principal(&self) -> Principal {
        Principal {
            id: self.id,
            username: self.username.clone(),
            is_superuser: self.is_superuser,
            capabilities: self.capabilities.clone(),
        }
    }

    pub fn follows(&self, other: i64) -> bool {
        self.following.contains(&other)
    }
}

/// Letters, digits and `@.+-_`.
static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

/// Input data for creating a new user.
#[derive(Debug, Clone, Validate)]
pub struct NewUser {
    #[validate(
        length(min = 1, max = 150, message = "Ensure this field has no more than 150 characters."),
        regex(
            path = *USERNAME_REGEX,
            message = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
        )
    )]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    pub password_hash: String,
    pub is_superuser: bool,
}

/// Partial profile update. `None` fields are unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[validate(length(max = 500, message = "Ensure this field has no more than 500 characters."))]
    pub bio: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 4,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            bio: String::new(),
            is_superuser: false,
            capabilities: [Capability::CanView].into_iter().collect(),
            following: [7].into_iter().collect(),
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let value = serde_json::to_value(user()).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["following"], serde_json::json!([7]));
        assert_eq!(value["capabilities"], serde_json::json!(["can_view"]));
    }

    #[test]
    fn test_principal_mirrors_user() {
        let principal = user().to_principal();
        assert_eq!(principal.id, 4);
        assert!(principal.has(Capability::CanView));
        assert!(!principal.has(Capability::CanDelete));
    }

    #[test]
    fn test_new_user_username_rules() {
        let mut new_user = NewUser {
            username: "reader.one@shelf".to_string(),
            email: "reader@example.com".to_string(),
            password_hash: String::new(),
            is_superuser: false,
        };
        assert!(new_user.validate().is_ok());

        new_user.username = "has space".to_string();
        let errors = new_user.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
    }

    #[test]
    fn test_profile_update_rules() {
        let update = ProfileUpdate {
            email: Some("nope".to_string()),
            bio: Some("x".repeat(501)),
        };
        let errors = update.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("bio"));
    }
}
