use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;

use crate::types::{FeedEntry, Post};

/// Explicit in-memory cache for list reads, keyed by string.
///
/// Owned by the read layer; nothing global. A slot is refreshed by
/// exactly three triggers: the background revalidation timer, a
/// reconnect signal, and an explicit mutation marking it stale.
///
/// Concurrent [`Store::fetch_with`] calls for the same key serialize on
/// a per-key lock, and a result fresher than the dedup window satisfies
/// the later callers without another network call.
pub struct Store {
    slots: Mutex<HashMap<String, Slot>>,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    dedup_window: Duration,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    value: Option<Vec<FeedEntry>>,
    error: Option<String>,
    fetched_at: Option<Instant>,
    stale: bool,
}

/// Snapshot of one slot as the read path exposes it: an erred slot
/// shows its message and an empty list, never stale data posing as a
/// result.
#[derive(Debug, Clone, Default)]
pub struct View {
    pub entries: Vec<FeedEntry>,
    pub error: Option<String>,
    pub is_loading: bool,
}

impl Store {
    pub fn new(dedup_window: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
            dedup_window,
        }
    }

    pub fn view(&self, key: &str) -> View {
        let slots = self.lock_slots();
        match slots.get(key) {
            Some(slot) => View {
                entries: slot.value.clone().unwrap_or_default(),
                error: slot.error.clone(),
                is_loading: slot.value.is_none() && slot.error.is_none(),
            },
            None => View {
                is_loading: true,
                ..View::default()
            },
        }
    }

    pub fn read(&self, key: &str) -> Option<Vec<FeedEntry>> {
        self.lock_slots().get(key).and_then(|slot| slot.value.clone())
    }

    /// Mutates the cached list in place, synchronously, and marks the
    /// slot stale so the next revalidation reconciles it. Creates an
    /// empty slot when the key has never been fetched.
    pub fn apply(&self, key: &str, f: impl FnOnce(&mut Vec<FeedEntry>)) {
        let mut slots = self.lock_slots();
        let slot = slots.entry(key.to_string()).or_default();
        let entries = slot.value.get_or_insert_with(Vec::new);
        f(entries);
        slot.stale = true;
    }

    /// Forces the next [`Store::fetch_with`] to hit the network even
    /// inside the dedup window.
    pub fn mark_stale(&self, key: &str) {
        if let Some(slot) = self.lock_slots().get_mut(key) {
            slot.stale = true;
        }
    }

    /// Runs `fetcher` for the key unless another caller produced a
    /// fresh result within the dedup window. On success the slot holds
    /// the confirmed rows; on failure it holds the message and drops
    /// the value.
    pub async fn fetch_with<F, Fut>(&self, key: &str, fetcher: F) -> Result<Vec<FeedEntry>, String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Post>, String>>,
    {
        let lock = self.key_lock(key);
        let _guard = lock.lock().await;

        if let Some(entries) = self.fresh_value(key) {
            return Ok(entries);
        }

        match fetcher().await {
            Ok(rows) => {
                let entries: Vec<FeedEntry> =
                    rows.into_iter().map(FeedEntry::Confirmed).collect();
                self.store_value(key, entries.clone());
                Ok(entries)
            }
            Err(message) => {
                self.store_error(key, message.clone());
                Err(message)
            }
        }
    }

    fn fresh_value(&self, key: &str) -> Option<Vec<FeedEntry>> {
        let slots = self.lock_slots();
        let slot = slots.get(key)?;
        if slot.stale || slot.error.is_some() {
            return None;
        }
        let fetched_at = slot.fetched_at?;
        if fetched_at.elapsed() > self.dedup_window {
            return None;
        }
        slot.value.clone()
    }

    fn store_value(&self, key: &str, entries: Vec<FeedEntry>) {
        let mut slots = self.lock_slots();
        let slot = slots.entry(key.to_string()).or_default();
        slot.value = Some(entries);
        slot.error = None;
        slot.fetched_at = Some(Instant::now());
        slot.stale = false;
    }

    fn store_error(&self, key: &str, message: String) {
        let mut slots = self.lock_slots();
        let slot = slots.entry(key.to_string()).or_default();
        slot.value = None;
        slot.error = Some(message);
        slot.fetched_at = Some(Instant::now());
        slot.stale = false;
    }

    fn key_lock(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        locks.entry(key.to_string()).or_default().clone()
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot>> {
        // a poisoned map only means another thread panicked mid-update;
        // the data itself is still a plain map of clones
        self.slots
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
