pub mod app;
pub mod backend;
pub mod cache;
pub mod config;
pub mod email;
pub mod posts;
pub mod session;
pub mod types;
pub mod util;

pub use app::App;
