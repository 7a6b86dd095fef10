use std::sync::Arc;

use crate::cache;
use crate::session::SessionWatcher;
use crate::types::Post;

use super::feed::POSTS_KEY;
use super::store::PostStore;
use super::surface;

pub const LIST_NOT_SIGNED_IN: &str = "You must be logged in to view your posts";
pub const DELETE_NOT_SIGNED_IN: &str = "You must be logged in to delete a post";

/// Outcome of a single-post lookup. A missing row is data, not an
/// error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Post),
    NotFound,
}

/// Author-scoped operations: own-posts listing, detail lookup, delete.
pub struct Manager<S> {
    store: Arc<S>,
    cache: Arc<cache::Store>,
    session: Arc<SessionWatcher>,
}

impl<S: PostStore> Manager<S> {
    pub fn new(store: Arc<S>, cache: Arc<cache::Store>, session: Arc<SessionWatcher>) -> Self {
        Self {
            store,
            cache,
            session,
        }
    }

    /// The signed-in user's posts, newest first.
    #[tracing::instrument(skip(self), name = "posts.manage.list_mine")]
    pub async fn list_mine(&self) -> Result<Vec<Post>, String> {
        let Some(user) = self.session.user() else {
            return Err(LIST_NOT_SIGNED_IN.to_string());
        };

        self.store
            .select_by_author(&user.id)
            .await
            .map_err(|report| surface("fetching posts", &report))
    }

    #[tracing::instrument(skip(self), name = "posts.manage.get")]
    pub async fn get(&self, id: &str) -> Result<Lookup, String> {
        let post = self
            .store
            .select_by_id(id)
            .await
            .map_err(|report| surface("fetching post", &report))?;

        Ok(match post {
            Some(post) => Lookup::Found(post),
            None => Lookup::NotFound,
        })
    }

    /// Deletes one of the caller's posts. The store checks ownership
    /// again; we still only send the delete scoped to both ids.
    #[tracing::instrument(skip(self), name = "posts.manage.delete")]
    pub async fn delete(&self, id: &str) -> Result<(), String> {
        let Some(user) = self.session.user() else {
            return Err(DELETE_NOT_SIGNED_IN.to_string());
        };

        self.store
            .delete(id, &user.id)
            .await
            .map_err(|report| surface("deleting post", &report))?;

        // drop the row from the cached feed and let the next
        // revalidation reconcile the rest
        self.cache.apply(POSTS_KEY, |entries| {
            entries.retain(|entry| entry.id() != id);
        });

        Ok(())
    }
}
