use error_stack::{Report, ResultExt};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

use crate::config;

mod error;
pub use error::*;

pub mod auth;
pub mod rows;

pub use auth::{AuthUser, Session};
pub use rows::NewPostRow;

/// HTTP client for the hosted blog service.
///
/// Row operations live in [`rows`], identity operations in [`auth`].
/// The project API key is attached to every request; a user access
/// token, once installed with [`Client::set_access_token`], takes its
/// place as the bearer credential.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base: Url,
    api_key: String,
    access_token: Arc<RwLock<Option<String>>>,
}

impl Client {
    pub fn new(cfg: &config::Backend) -> Result<Self> {
        let base = Url::parse(&cfg.url).change_context(Error::InvalidUrl)?;

        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(&cfg.api_key)
            .change_context(Error::InvalidUrl)
            .attach_printable("api key contains invalid header characters")?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.get()))
            .default_headers(headers)
            .build()
            .into_backend_error()?;

        Ok(Self {
            http,
            base,
            api_key: cfg.api_key.clone(),
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Installs the signed-in user's access token as the bearer
    /// credential; `None` falls back to the project API key.
    pub fn set_access_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.access_token.write() {
            *slot = token;
        }
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .change_context(Error::InvalidUrl)
            .attach_printable_lazy(|| format!("cannot join endpoint path {path:?}"))
    }

    pub(crate) fn bearer(&self) -> String {
        self.access_token
            .read()
            .ok()
            .and_then(|slot| slot.clone())
            .unwrap_or_else(|| self.api_key.clone())
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("base", &self.base).finish()
    }
}

/// Error payload the service sends alongside non-2xx statuses. The
/// field name differs between the row and auth surfaces.
#[derive(Debug, Deserialize)]
pub(crate) struct RejectionBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
}

impl RejectionBody {
    fn into_message(self, status: reqwest::StatusCode) -> String {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .unwrap_or_else(|| format!("request failed with status {status}"))
    }
}

/// Turns a non-success response into [`Error::Rejected`] carrying the
/// store's own message.
pub(crate) async fn reject(response: reqwest::Response) -> Report<Error> {
    let status = response.status();
    let body = response
        .json::<RejectionBody>()
        .await
        .ok()
        .unwrap_or(RejectionBody {
            message: None,
            msg: None,
            error_description: None,
        });

    Report::new(Error::Rejected(body.into_message(status)))
}
