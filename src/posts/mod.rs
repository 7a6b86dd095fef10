pub mod compose;
pub mod feed;
pub mod manage;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use compose::Composer;
pub use feed::{Feed, POSTS_KEY};
pub use manage::Manager;
pub use store::PostStore;

use crate::backend::{self, ErrorExt2};

/// User-facing message for a failed store operation: the store's own
/// message when it rejected the request, the error class otherwise.
pub(crate) fn surface(action: &str, report: &error_stack::Report<backend::Error>) -> String {
    match report.rejection() {
        Some(message) => format!("Error {action}: {message}"),
        None => format!("Error {action}: {}", report.current_context()),
    }
}
