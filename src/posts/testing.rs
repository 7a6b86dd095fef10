use chrono::Utc;
use error_stack::Report;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::store::PostStore;
use crate::backend::{Error, NewPostRow, Result};
use crate::types::{NewPost, Post};

/// Failure to inject into the next matching [`MemoryStore`] call.
pub(crate) enum Failure {
    Rejected(String),
    Unavailable,
}

impl Failure {
    fn into_report(self) -> Report<Error> {
        match self {
            Self::Rejected(message) => Report::new(Error::Rejected(message)),
            Self::Unavailable => Report::new(Error::Unavailable),
        }
    }
}

/// In-memory [`PostStore`] for the flow tests: rows kept newest first,
/// one-shot failure injection per operation.
pub(crate) struct MemoryStore {
    rows: Mutex<Vec<Post>>,
    seq: AtomicUsize,
    select_calls: AtomicUsize,
    fail_insert: Mutex<Option<Failure>>,
    fail_select: Mutex<Option<Failure>>,
    fail_delete: Mutex<Option<Failure>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            seq: AtomicUsize::new(0),
            select_calls: AtomicUsize::new(0),
            fail_insert: Mutex::new(None),
            fail_select: Mutex::new(None),
            fail_delete: Mutex::new(None),
        }
    }

    pub(crate) async fn seed(&self, form: NewPost, author_id: &str) -> Post {
        let (title, content) = form.trimmed().expect("seed posts must be non-empty");
        self.insert(NewPostRow {
            title: title.to_string(),
            content: content.to_string(),
            author_id: author_id.to_string(),
        })
        .await
        .unwrap()
    }

    pub(crate) fn fail_next_insert(&self, failure: Failure) {
        *self.fail_insert.lock().unwrap() = Some(failure);
    }

    pub(crate) fn fail_next_select(&self, failure: Failure) {
        *self.fail_select.lock().unwrap() = Some(failure);
    }

    pub(crate) fn fail_next_delete(&self, failure: Failure) {
        *self.fail_delete.lock().unwrap() = Some(failure);
    }

    pub(crate) fn select_calls(&self) -> usize {
        self.select_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn take(&self, slot: &Mutex<Option<Failure>>) -> Option<Failure> {
        slot.lock().unwrap().take()
    }
}

impl PostStore for MemoryStore {
    async fn insert(&self, row: NewPostRow) -> Result<Post> {
        if let Some(failure) = self.take(&self.fail_insert) {
            return Err(failure.into_report());
        }

        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let post = Post {
            id: format!("post-{seq}"),
            title: row.title,
            content: row.content,
            author_id: row.author_id,
            created_at: Utc::now(),
        };

        self.rows.lock().unwrap().insert(0, post.clone());
        Ok(post)
    }

    async fn select_all(&self) -> Result<Vec<Post>> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.take(&self.fail_select) {
            return Err(failure.into_report());
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn select_by_author(&self, author_id: &str) -> Result<Vec<Post>> {
        if let Some(failure) = self.take(&self.fail_select) {
            return Err(failure.into_report());
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|post| post.author_id == author_id)
            .cloned()
            .collect())
    }

    async fn select_by_id(&self, id: &str) -> Result<Option<Post>> {
        if let Some(failure) = self.take(&self.fail_select) {
            return Err(failure.into_report());
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|post| post.id == id)
            .cloned())
    }

    async fn delete(&self, id: &str, author_id: &str) -> Result<()> {
        if let Some(failure) = self.take(&self.fail_delete) {
            return Err(failure.into_report());
        }
        // deleting a row that is not yours (or gone) is a silent no-op,
        // matching the store's filtered delete
        self.rows
            .lock()
            .unwrap()
            .retain(|post| !(post.id == id && post.author_id == author_id));
        Ok(())
    }
}
