use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::backend::{NewPostRow, Result};
use crate::types::Post;

/// Row operations the post flows need from the backing store.
///
/// [`crate::backend::Client`] is the real implementation; tests inject
/// an in-memory one. Ownership of rows is enforced on the other side of
/// this trait; deletes always carry both the row id and the author id.
pub trait PostStore: Send + Sync {
    fn insert(&self, row: NewPostRow) -> impl Future<Output = Result<Post>> + Send;
    fn select_all(&self) -> impl Future<Output = Result<Vec<Post>>> + Send;
    fn select_by_author(&self, author_id: &str) -> impl Future<Output = Result<Vec<Post>>> + Send;
    fn select_by_id(&self, id: &str) -> impl Future<Output = Result<Option<Post>>> + Send;
    fn delete(&self, id: &str, author_id: &str) -> impl Future<Output = Result<()>> + Send;
}

pub const TEMP_ID_PREFIX: &str = "temp-";

static LAST_TEMP_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Placeholder id for an optimistic insert, `temp-<millis>`.
///
/// Two calls within the same millisecond would collide with the wall
/// clock alone, so the value is kept strictly monotonic.
pub fn next_temp_id() -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let mut prev = LAST_TEMP_MILLIS.load(Ordering::SeqCst);
    loop {
        let next = now.max(prev + 1);
        match LAST_TEMP_MILLIS.compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(..) => return format!("{TEMP_ID_PREFIX}{next}"),
            Err(observed) => prev = observed,
        }
    }
}

pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_ids_are_unique_and_well_formed() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            let id = next_temp_id();
            assert!(is_temp_id(&id));
            assert!(id[TEMP_ID_PREFIX.len()..].parse::<i64>().is_ok());
            assert!(seen.insert(id));
        }
    }
}
