use serde::{Deserialize, Serialize};

pub const TITLE_MAX: usize = 200;
pub const CONTENT_MAX: usize = 5000;

/// Untrimmed user input for a new post.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Trims both fields and rejects the form if either one is empty
    /// afterwards. A post must never reach the store with a blank
    /// title or content.
    pub fn trimmed(&self) -> Option<(&str, &str)> {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() || content.is_empty() {
            return None;
        }
        Some((title, content))
    }

    pub fn fits_limits(&self) -> bool {
        self.title.trim().len() <= TITLE_MAX && self.content.trim().len() <= CONTENT_MAX
    }
}
