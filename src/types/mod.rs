pub mod form;
pub mod post;

pub use form::NewPost;
pub use post::{FeedEntry, Post};
