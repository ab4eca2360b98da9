//! DTOs for account endpoints.

use serde::Serialize;

/// Confirmation returned by follow and unfollow.
#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub message: String,
}

impl FollowResponse {
    pub fn followed(username: &str) -> Self {
        Self {
            message: format!("You are now following {username}."),
        }
    }

    pub fn unfollowed(username: &str) -> Self {
        Self {
            message: format!("You unfollowed {username}."),
        }
    }
}
