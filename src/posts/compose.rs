use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::backend::{ErrorExt2, NewPostRow};
use crate::cache;
use crate::session::SessionWatcher;
use crate::types::{FeedEntry, NewPost, Post};

use super::feed::{Feed, POSTS_KEY};
use super::store::{next_temp_id, PostStore};

pub const NOT_SIGNED_IN: &str = "You must be logged in to create a post";
pub const EMPTY_FIELDS: &str = "Please fill in both title and content";
pub const OVER_LIMITS: &str = "Title or content is too long";
pub const UNEXPECTED: &str = "An unexpected error occurred. Please try again.";

/// Optimistic post creation.
///
/// A placeholder entry goes to the head of the cached feed before the
/// store answers; on success it collapses into the confirmed record in
/// place, on failure it is removed and the rest of the cache is left
/// untouched. Precondition failures never reach the network.
pub struct Composer<S> {
    store: Arc<S>,
    cache: Arc<cache::Store>,
    session: Arc<SessionWatcher>,
    feed: Feed<S>,
    busy: AtomicBool,
    error: Mutex<Option<String>>,
}

impl<S: PostStore> Composer<S> {
    pub fn new(
        store: Arc<S>,
        cache: Arc<cache::Store>,
        session: Arc<SessionWatcher>,
        feed: Feed<S>,
    ) -> Self {
        Self {
            store,
            cache,
            session,
            feed,
            busy: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    /// True from call start until the request settles.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn last_error(&self) -> Option<String> {
        self.error
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn clear_error(&self) {
        self.set_error(None);
    }

    /// Creates a post. Returns the confirmed record, or `None` with the
    /// reason available through [`Composer::last_error`].
    #[tracing::instrument(skip_all, name = "posts.compose.create")]
    pub async fn create(&self, form: NewPost) -> Option<Post> {
        let Some(user) = self.session.user() else {
            self.set_error(Some(NOT_SIGNED_IN.to_string()));
            return None;
        };

        let Some((title, content)) = form.trimmed() else {
            self.set_error(Some(EMPTY_FIELDS.to_string()));
            return None;
        };

        if !form.fits_limits() {
            self.set_error(Some(OVER_LIMITS.to_string()));
            return None;
        }

        self.busy.store(true, Ordering::SeqCst);
        self.set_error(None);

        let result = self.run(&user.id, title, content).await;
        self.busy.store(false, Ordering::SeqCst);

        match result {
            Ok(post) => Some(post),
            Err(message) => {
                self.set_error(Some(message));
                None
            }
        }
    }

    async fn run(&self, author_id: &str, title: &str, content: &str) -> Result<Post, String> {
        let placeholder = Post {
            id: next_temp_id(),
            title: title.to_string(),
            content: content.to_string(),
            author_id: author_id.to_string(),
            created_at: Utc::now(),
        };
        let temp_id = placeholder.id.clone();

        // optimistic insert, synchronous, no revalidation yet
        self.cache.apply(POSTS_KEY, |entries| {
            entries.insert(0, FeedEntry::Pending(placeholder));
        });

        let row = NewPostRow {
            title: title.to_string(),
            content: content.to_string(),
            author_id: author_id.to_string(),
        };

        match self.store.insert(row).await {
            Ok(record) => {
                // collapse the placeholder in place, order preserved
                self.cache.apply(POSTS_KEY, |entries| {
                    for entry in entries.iter_mut() {
                        if entry.id() == temp_id {
                            *entry = FeedEntry::Confirmed(record.clone());
                        }
                    }
                });
                self.feed.revalidate_soon();
                Ok(record)
            }
            Err(report) => {
                // rollback: only the placeholder leaves the cache
                self.cache.apply(POSTS_KEY, |entries| {
                    entries.retain(|entry| entry.id() != temp_id);
                });
                if report.is_unavailable() {
                    tracing::warn!("store unreachable during post creation");
                }
                Err(match report.rejection() {
                    Some(message) => format!("Error creating post: {message}"),
                    None => UNEXPECTED.to_string(),
                })
            }
        }
    }

    fn set_error(&self, message: Option<String>) {
        *self
            .error
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = message;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::posts::store::is_temp_id;
    use crate::posts::testing::{Failure, MemoryStore};
    use std::time::Duration;

    struct Harness {
        store: Arc<MemoryStore>,
        cache: Arc<cache::Store>,
        session: Arc<SessionWatcher>,
        composer: Composer<MemoryStore>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(cache::Store::new(Duration::from_secs(60)));
        let session = Arc::new(SessionWatcher::new());
        let config = Arc::new(config::Cache::default());
        let feed = Feed::new(Arc::clone(&store), Arc::clone(&cache), config);
        let composer = Composer::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            Arc::clone(&session),
            feed,
        );
        Harness {
            store,
            cache,
            session,
            composer,
        }
    }

    fn sign_in(session: &SessionWatcher, user_id: &str) {
        session.set_session(
            serde_json::from_value(serde_json::json!({
                "access_token": "token",
                "refresh_token": "refresh",
                "user": { "id": user_id, "email": "alice@example.net", "confirmed_at": null },
            }))
            .unwrap(),
        );
    }

    fn cached_len(cache: &cache::Store) -> usize {
        cache.read(POSTS_KEY).map(|v| v.len()).unwrap_or_default()
    }

    #[tokio::test]
    async fn rejects_unauthenticated_callers_without_touching_the_store() {
        let h = harness();
        let result = h.composer.create(NewPost::new("title", "content")).await;

        assert!(result.is_none());
        assert_eq!(h.composer.last_error().as_deref(), Some(NOT_SIGNED_IN));
        assert_eq!(h.store.len(), 0);
        assert!(h.cache.read(POSTS_KEY).is_none());
    }

    #[tokio::test]
    async fn rejects_blank_fields_without_touching_the_store() {
        let h = harness();
        sign_in(&h.session, "alice");

        for form in [
            NewPost::new("", ""),
            NewPost::new("   ", "content"),
            NewPost::new("title", "\n\t"),
        ] {
            let result = h.composer.create(form).await;
            assert!(result.is_none());
            assert_eq!(h.composer.last_error().as_deref(), Some(EMPTY_FIELDS));
        }

        assert_eq!(h.store.len(), 0);
        assert!(h.cache.read(POSTS_KEY).is_none());
    }

    #[tokio::test]
    async fn rejects_oversized_fields_without_touching_the_store() {
        use crate::types::form::{CONTENT_MAX, TITLE_MAX};

        let h = harness();
        sign_in(&h.session, "alice");

        for form in [
            NewPost::new("a".repeat(TITLE_MAX + 1), "content"),
            NewPost::new("title", "b".repeat(CONTENT_MAX + 1)),
        ] {
            let result = h.composer.create(form).await;
            assert!(result.is_none());
            assert_eq!(h.composer.last_error().as_deref(), Some(OVER_LIMITS));
        }

        assert_eq!(h.store.len(), 0);
        assert!(h.cache.read(POSTS_KEY).is_none());
    }

    #[tokio::test]
    async fn confirmed_post_carries_trimmed_input() {
        let h = harness();
        sign_in(&h.session, "alice");

        let before = cached_len(&h.cache);
        let post = h
            .composer
            .create(NewPost::new("  My title  ", "\tbody text\n"))
            .await
            .unwrap();

        assert_eq!(post.title, "My title");
        assert_eq!(post.content, "body text");
        assert_eq!(post.author_id, "alice");
        assert!(!is_temp_id(&post.id));
        assert!(h.composer.last_error().is_none());

        // exactly one more cached entry, confirmed in place
        let entries = h.cache.read(POSTS_KEY).unwrap();
        assert_eq!(entries.len(), before + 1);
        assert_eq!(entries[0], FeedEntry::Confirmed(post));
    }

    #[tokio::test]
    async fn store_rejection_rolls_back_the_placeholder() {
        let h = harness();
        sign_in(&h.session, "alice");
        h.store.seed(NewPost::new("existing", "row"), "bob").await;
        h.composer
            .create(NewPost::new("warmup", "fills the cache"))
            .await
            .unwrap();

        let before = h.cache.read(POSTS_KEY).unwrap();
        h.store
            .fail_next_insert(Failure::Rejected("row violates policy".into()));

        let result = h.composer.create(NewPost::new("title", "content")).await;
        assert!(result.is_none());
        assert_eq!(
            h.composer.last_error().as_deref(),
            Some("Error creating post: row violates policy")
        );

        // rollback invariant: no placeholder left, rest untouched
        let after = h.cache.read(POSTS_KEY).unwrap();
        assert_eq!(after, before);
        assert!(after.iter().all(|entry| !entry.is_pending()));
    }

    #[tokio::test]
    async fn transport_failure_surfaces_the_generic_message() {
        let h = harness();
        sign_in(&h.session, "alice");
        h.store.fail_next_insert(Failure::Unavailable);

        let result = h.composer.create(NewPost::new("title", "content")).await;
        assert!(result.is_none());
        assert_eq!(h.composer.last_error().as_deref(), Some(UNEXPECTED));
        assert_eq!(cached_len(&h.cache), 0);
    }

    #[tokio::test]
    async fn clear_error_resets_the_message() {
        let h = harness();
        h.composer.create(NewPost::new("t", "c")).await;
        assert!(h.composer.last_error().is_some());

        h.composer.clear_error();
        assert!(h.composer.last_error().is_none());
    }

    #[tokio::test]
    async fn busy_flag_settles_after_the_call() {
        let h = harness();
        sign_in(&h.session, "alice");
        assert!(!h.composer.is_busy());
        h.composer
            .create(NewPost::new("title", "content"))
            .await
            .unwrap();
        assert!(!h.composer.is_busy());
    }

    #[tokio::test]
    async fn concurrent_creations_use_distinct_placeholders() {
        let h = harness();
        sign_in(&h.session, "alice");

        let a = h.composer.create(NewPost::new("one", "body"));
        let b = h.composer.create(NewPost::new("two", "body"));
        let (a, b) = tokio::join!(a, b);

        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.id, b.id);
        assert_eq!(cached_len(&h.cache), 2);
    }
}
