use error_stack::Report;
use serde::Serialize;

use super::{reject, Client, Error, ErrorExt, Result};
use crate::posts::store::PostStore;
use crate::types::Post;

/// Row sent to the store on insert; `id` and `created_at` come back
/// server-assigned.
#[derive(Debug, Clone, Serialize)]
pub struct NewPostRow {
    pub title: String,
    pub content: String,
    pub author_id: String,
}

const POSTS_PATH: &str = "rest/v1/posts";

impl Client {
    async fn select_posts(&self, filters: &[(&str, String)]) -> Result<Vec<Post>> {
        let url = self.endpoint(POSTS_PATH)?;
        let mut request = self
            .http()
            .get(url)
            .bearer_auth(self.bearer())
            .query(&[("select", "*"), ("order", "created_at.desc")]);

        for (key, value) in filters {
            request = request.query(&[(key, value.as_str())]);
        }

        let response = request.send().await.into_backend_error()?;
        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        response.json::<Vec<Post>>().await.into_backend_error()
    }
}

impl PostStore for Client {
    #[tracing::instrument(skip_all, name = "backend.posts.insert")]
    async fn insert(&self, row: NewPostRow) -> Result<Post> {
        let url = self.endpoint(POSTS_PATH)?;
        let response = self
            .http()
            .post(url)
            .bearer_auth(self.bearer())
            .header("Prefer", "return=representation")
            .json(&[&row])
            .send()
            .await
            .into_backend_error()?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        let mut rows = response.json::<Vec<Post>>().await.into_backend_error()?;
        rows.pop()
            .ok_or_else(|| Report::new(Error::Rejected("insert returned no row".to_string())))
    }

    #[tracing::instrument(skip_all, name = "backend.posts.select_all")]
    async fn select_all(&self) -> Result<Vec<Post>> {
        self.select_posts(&[]).await
    }

    #[tracing::instrument(skip_all, name = "backend.posts.select_by_author")]
    async fn select_by_author(&self, author_id: &str) -> Result<Vec<Post>> {
        self.select_posts(&[("author_id", format!("eq.{author_id}"))])
            .await
    }

    #[tracing::instrument(skip_all, name = "backend.posts.select_by_id")]
    async fn select_by_id(&self, id: &str) -> Result<Option<Post>> {
        let mut rows = self.select_posts(&[("id", format!("eq.{id}"))]).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    #[tracing::instrument(skip_all, name = "backend.posts.delete")]
    async fn delete(&self, id: &str, author_id: &str) -> Result<()> {
        let url = self.endpoint(POSTS_PATH)?;
        let response = self
            .http()
            .delete(url)
            .bearer_auth(self.bearer())
            .query(&[
                ("id", format!("eq.{id}")),
                ("author_id", format!("eq.{author_id}")),
            ])
            .send()
            .await
            .into_backend_error()?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        Ok(())
    }
}
