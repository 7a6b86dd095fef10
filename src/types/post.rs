use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A published blog post as the backing store returns it.
///
/// `id` is assigned by the store on insert; placeholder entries created
/// during an optimistic write carry a `temp-<millis>` id instead and only
/// ever live inside the local cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

/// One entry of the cached feed.
///
/// A `Pending` entry is an optimistic placeholder that has not been
/// acknowledged by the store yet; it collapses into `Confirmed` once the
/// insert settles, or is removed from the cache if the insert fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEntry {
    Pending(Post),
    Confirmed(Post),
}

impl FeedEntry {
    pub fn post(&self) -> &Post {
        match self {
            Self::Pending(post) | Self::Confirmed(post) => post,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(..))
    }

    pub fn id(&self) -> &str {
        &self.post().id
    }
}
