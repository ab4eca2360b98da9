//! Feed query parameters and response.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::domain::entities::Post;

/// Feed pagination. Pages start at 1.
///
/// Uses `serde_with` to parse the page number from the query string.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct FeedParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,
}

impl FeedParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<Post>,
}
