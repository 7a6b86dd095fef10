use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::cache;
use crate::config;
use crate::types::FeedEntry;

use super::store::PostStore;
use super::surface;

/// Cache key of the public feed.
pub const POSTS_KEY: &str = "posts";

/// Read path for the public feed: newest first, cached, deduplicated,
/// refreshed by a background loop on a fixed interval and on reconnect.
/// Never on anything resembling "window focus".
pub struct Feed<S> {
    store: Arc<S>,
    cache: Arc<cache::Store>,
    config: Arc<config::Cache>,
    wakeup: Arc<Notify>,
}

impl<S> Clone for Feed<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            config: Arc::clone(&self.config),
            wakeup: Arc::clone(&self.wakeup),
        }
    }
}

impl<S: PostStore> Feed<S> {
    pub fn new(store: Arc<S>, cache: Arc<cache::Store>, config: Arc<config::Cache>) -> Self {
        Self {
            store,
            cache,
            config,
            wakeup: Arc::new(Notify::new()),
        }
    }

    /// Current cache snapshot, no network.
    pub fn view(&self) -> cache::View {
        self.cache.view(POSTS_KEY)
    }

    /// Dedup'd read: serves the cached list while it is fresh, fetches
    /// otherwise. Retries belong to [`Feed::refresh`] and the
    /// background loop, not here.
    pub async fn load(&self) -> Result<Vec<FeedEntry>, String> {
        self.fetch_once().await
    }

    /// Forced revalidation with the configured error retries.
    #[tracing::instrument(skip(self), name = "posts.feed.refresh")]
    pub async fn refresh(&self) -> Result<Vec<FeedEntry>, String> {
        self.cache.mark_stale(POSTS_KEY);

        let mut attempts_left = self.config.error_retry_count;
        loop {
            match self.fetch_once().await {
                Ok(entries) => return Ok(entries),
                Err(message) if attempts_left > 0 => {
                    attempts_left -= 1;
                    tracing::debug!(%message, attempts_left, "feed fetch failed, retrying");
                    tokio::time::sleep(self.config.error_retry_interval()).await;
                }
                Err(message) => return Err(message),
            }
        }
    }

    /// Marks the feed stale and pokes the background loop. Used after a
    /// confirmed write to reconcile concurrent changes.
    pub fn revalidate_soon(&self) {
        self.cache.mark_stale(POSTS_KEY);
        self.wakeup.notify_one();
    }

    /// Connectivity came back.
    pub fn notify_reconnect(&self) {
        if self.config.revalidate_on_reconnect {
            self.revalidate_soon();
        }
    }

    async fn fetch_once(&self) -> Result<Vec<FeedEntry>, String> {
        self.cache
            .fetch_with(POSTS_KEY, || async {
                self.store
                    .select_all()
                    .await
                    .map_err(|report| surface("fetching posts", &report))
            })
            .await
    }
}

impl<S: PostStore + 'static> Feed<S> {
    /// Spawns the revalidation loop: a tick per refresh interval plus
    /// whatever [`Feed::revalidate_soon`] and reconnects push in.
    pub fn spawn_revalidator(&self) -> JoinHandle<()> {
        let feed = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(feed.config.refresh_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick resolves immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => feed.cache.mark_stale(POSTS_KEY),
                    _ = feed.wakeup.notified() => {}
                }

                if let Err(message) = feed.fetch_once().await {
                    tracing::warn!(%message, "background feed revalidation failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::testing::{Failure, MemoryStore};
    use crate::types::NewPost;

    fn quick_config() -> Arc<config::Cache> {
        Arc::new(config::Cache {
            error_retry_count: 0,
            ..Default::default()
        })
    }

    fn feed_over(store: Arc<MemoryStore>) -> Feed<MemoryStore> {
        let cache = Arc::new(cache::Store::new(std::time::Duration::from_secs(60)));
        Feed::new(store, cache, quick_config())
    }

    #[tokio::test]
    async fn serves_newest_first() {
        let store = Arc::new(MemoryStore::new());
        store.seed(NewPost::new("first", "a"), "alice").await;
        store.seed(NewPost::new("second", "b"), "bob").await;

        let feed = feed_over(Arc::clone(&store));
        let entries = feed.load().await.unwrap();
        assert_eq!(entries[0].post().title, "second");
        assert_eq!(entries[1].post().title, "first");
    }

    #[tokio::test]
    async fn repeated_refresh_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        store.seed(NewPost::new("first", "a"), "alice").await;
        store.seed(NewPost::new("second", "b"), "alice").await;

        let feed = feed_over(store);
        let first = feed.refresh().await.unwrap();
        let second = feed.refresh().await.unwrap();
        let third = feed.refresh().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[tokio::test]
    async fn surfaces_store_errors_with_message() {
        let store = Arc::new(MemoryStore::new());
        store.fail_next_select(Failure::Rejected("relation missing".into()));

        let feed = feed_over(store);
        let error = feed.load().await.unwrap_err();
        assert_eq!(error, "Error fetching posts: relation missing");

        let view = feed.view();
        assert!(view.entries.is_empty());
        assert_eq!(view.error.as_deref(), Some(&*error));
    }

    #[tokio::test]
    async fn reconnect_marks_the_feed_stale() {
        let store = Arc::new(MemoryStore::new());
        store.seed(NewPost::new("first", "a"), "alice").await;

        let feed = feed_over(Arc::clone(&store));
        assert_eq!(feed.load().await.unwrap().len(), 1);

        store.seed(NewPost::new("second", "b"), "alice").await;
        // still inside the dedup window; only the reconnect below
        // invalidates the slot
        assert_eq!(feed.load().await.unwrap().len(), 1);

        feed.notify_reconnect();
        assert_eq!(feed.load().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reconnect_can_be_disabled() {
        let store = Arc::new(MemoryStore::new());
        store.seed(NewPost::new("first", "a"), "alice").await;

        let cache = Arc::new(cache::Store::new(std::time::Duration::from_secs(60)));
        let config = Arc::new(config::Cache {
            revalidate_on_reconnect: false,
            ..Default::default()
        });
        let feed = Feed::new(Arc::clone(&store), cache, config);

        feed.load().await.unwrap();
        store.seed(NewPost::new("second", "b"), "alice").await;
        feed.notify_reconnect();
        assert_eq!(feed.load().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn background_revalidator_picks_up_new_rows() {
        let store = Arc::new(MemoryStore::new());
        store.seed(NewPost::new("first", "a"), "alice").await;

        let feed = feed_over(Arc::clone(&store));
        feed.load().await.unwrap();

        let task = feed.spawn_revalidator();
        tokio::task::yield_now().await;

        store.seed(NewPost::new("second", "b"), "alice").await;
        tokio::time::advance(std::time::Duration::from_secs(31)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(feed.view().entries.len(), 2);
        task.abort();
    }

    #[tokio::test]
    async fn load_inside_window_does_not_refetch() {
        let store = Arc::new(MemoryStore::new());
        store.seed(NewPost::new("first", "a"), "alice").await;

        let feed = feed_over(Arc::clone(&store));
        feed.load().await.unwrap();
        feed.load().await.unwrap();
        feed.load().await.unwrap();
        assert_eq!(store.select_calls(), 1);
    }
}
