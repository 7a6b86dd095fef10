use thiserror::Error;

mod backend;
mod cache;
mod client;
mod email;

pub use backend::Backend;
pub use cache::Cache;
pub use client::Client;
pub use email::Email;

#[derive(Debug, Error)]
#[error("Failed to load configuration")]
pub struct ParseError;
