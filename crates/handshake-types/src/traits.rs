//! Traits for snapshot persistence and the external crawl feed.

use crate::{FollowingPage, GraphSnapshot};
use async_trait::async_trait;

/// Persistence backend for a `GraphSnapshot`.
///
/// Contract: `load` returns `Ok(None)` when nothing was ever saved at the
/// location. Callers treat both `Ok(None)` and `Err` as a cold start.
pub trait SnapshotStore: Send + Sync {
    fn save(&self, snapshot: &GraphSnapshot) -> Result<(), SnapshotError>;

    fn load(&self) -> Result<Option<GraphSnapshot>, SnapshotError>;
}

/// Source of crawl observations. Implementations own all network I/O.
#[async_trait]
pub trait CrawlFeed: Send + Sync {
    /// Fetch the profile and complete following list of `username`, page by page.
    async fn fetch_following(&self, username: &str) -> Result<Vec<FollowingPage>, CrawlFeedError>;
}

#[async_trait]
impl<T: CrawlFeed + ?Sized> CrawlFeed for std::sync::Arc<T> {
    async fn fetch_following(&self, username: &str) -> Result<Vec<FollowingPage>, CrawlFeedError> {
        (**self).fetch_following(username).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding: {0}")]
    Encode(String),
    #[error("snapshot decoding: {0}")]
    Decode(String),
    #[error("snapshot backend: {0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CrawlFeedError {
    #[error("fetch failed for {username}: {reason}")]
    Fetch { username: String, reason: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}
