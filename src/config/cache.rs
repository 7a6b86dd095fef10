use serde::Deserialize;
use std::num::NonZeroU64;
use std::time::Duration;

/// Tunables for the posts read cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Cache {
    /// How often the background revalidator re-fetches the feed.
    ///
    /// **Environment variables**:
    /// - `QUILL_CACHE_REFRESH_INTERVAL_SECS`
    pub refresh_interval_secs: NonZeroU64,
    /// Concurrent fetches for the same key within this window are
    /// collapsed into a single network call.
    ///
    /// **Environment variables**:
    /// - `QUILL_CACHE_DEDUP_WINDOW_SECS`
    pub dedup_window_secs: u64,
    /// How many times a failed feed fetch is retried before the error
    /// is surfaced.
    ///
    /// **Environment variables**:
    /// - `QUILL_CACHE_ERROR_RETRY_COUNT`
    pub error_retry_count: u32,
    /// Delay between those retries.
    ///
    /// **Environment variables**:
    /// - `QUILL_CACHE_ERROR_RETRY_INTERVAL_SECS`
    pub error_retry_interval_secs: NonZeroU64,
    /// Revalidate the feed when connectivity comes back. There is no
    /// equivalent for "window focus"; the cache never revalidates on it.
    ///
    /// **Environment variables**:
    /// - `QUILL_CACHE_REVALIDATE_ON_RECONNECT`
    pub revalidate_on_reconnect: bool,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            refresh_interval_secs: Self::non_zero(30),
            dedup_window_secs: 2,
            error_retry_count: 3,
            error_retry_interval_secs: Self::non_zero(5),
            revalidate_on_reconnect: true,
        }
    }
}

impl Cache {
    const fn non_zero(value: u64) -> NonZeroU64 {
        match NonZeroU64::new(value) {
            Some(n) => n,
            None => panic!("cache duration default is accidentally set to 0"),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.get())
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_secs(self.dedup_window_secs)
    }

    pub fn error_retry_interval(&self) -> Duration {
        Duration::from_secs(self.error_retry_interval_secs.get())
    }
}
