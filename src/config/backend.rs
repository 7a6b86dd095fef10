use error_stack::{Report, Result, ResultExt};
use serde::Deserialize;
use std::num::NonZeroU64;
use thiserror::Error;

/// Configuration for connecting to the hosted blog service.
#[derive(Debug, Clone, Deserialize)]
pub struct Backend {
    /// Base URL of the hosted service.
    ///
    /// **Environment variables**:
    /// - `QUILL_BACKEND_URL` or `SERVICE_URL`
    pub url: String,
    /// Project API key sent with every request.
    ///
    /// **Environment variables**:
    /// - `QUILL_BACKEND_API_KEY` or `SERVICE_KEY`
    pub api_key: String,
    /// Per-request time limit. Applies to reads and auth calls; the
    /// create path intentionally has no extra deadline on top of it.
    ///
    /// **Environment variables**:
    /// - `QUILL_BACKEND_TIMEOUT_SECS`
    #[serde(default = "Backend::default_timeout_secs")]
    pub timeout_secs: NonZeroU64,
}

#[derive(Debug, Error)]
#[error("Invalid backend configuration")]
pub struct InvalidBackend;

impl Backend {
    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    // Required by serde
    const fn default_timeout_secs() -> NonZeroU64 {
        match NonZeroU64::new(Self::DEFAULT_TIMEOUT_SECS) {
            Some(n) => n,
            None => panic!("DEFAULT_TIMEOUT_SECS is accidentally set to 0"),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), InvalidBackend> {
        url::Url::parse(&self.url)
            .change_context(InvalidBackend)
            .attach_printable("`backend.url` must be a valid URL")?;

        if self.api_key.trim().is_empty() {
            return Err(Report::new(InvalidBackend)
                .attach_printable("`backend.api_key` must not be empty"));
        }

        Ok(())
    }
}
