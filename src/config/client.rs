use error_stack::{Report, Result, ResultExt};
use serde::Deserialize;

use super::ParseError;
use crate::util::figment::FigmentErrorAttachable;

#[derive(Debug, Deserialize)]
pub struct Client {
    pub backend: super::Backend,
    #[serde(default)]
    pub cache: super::Cache,
    #[serde(default)]
    pub email: super::Email,
}

impl Client {
    pub fn load() -> Result<Self, ParseError> {
        dotenvy::dotenv().ok();

        let config = Self::figment()
            .extract::<Self>()
            .map_err(|e| Report::new(ParseError).attach_figment_error(e))?;

        config.backend.validate().change_context(ParseError)?;
        config.email.validate().change_context(ParseError)?;

        Ok(config)
    }
}

impl Client {
    const DEFAULT_CONFIG_FILE: &'static str = "quill.toml";

    /// Creates a default [`figment::Figment`] object to load client
    /// configuration. Split out from [`Client::load`] for testing.
    pub(crate) fn figment() -> figment::Figment {
        use figment::{
            providers::{Env, Format, Toml},
            Figment,
        };

        Figment::new()
            .merge(Toml::file(Self::DEFAULT_CONFIG_FILE))
            // figment's env provider splits on every underscore, so any
            // field that itself contains one needs an explicit mapping.
            .merge(Env::prefixed("QUILL_").map(|v| match v.as_str() {
                "BACKEND_URL" => "backend.url".into(),
                "BACKEND_API_KEY" => "backend.api_key".into(),
                "BACKEND_TIMEOUT_SECS" => "backend.timeout_secs".into(),

                "CACHE_REFRESH_INTERVAL_SECS" => "cache.refresh_interval_secs".into(),
                "CACHE_DEDUP_WINDOW_SECS" => "cache.dedup_window_secs".into(),
                "CACHE_ERROR_RETRY_COUNT" => "cache.error_retry_count".into(),
                "CACHE_ERROR_RETRY_INTERVAL_SECS" => "cache.error_retry_interval_secs".into(),
                "CACHE_REVALIDATE_ON_RECONNECT" => "cache.revalidate_on_reconnect".into(),

                "EMAIL_VERIFY_URL" => "email.verify_url".into(),
                "EMAIL_API_KEY" => "email.api_key".into(),

                _ => v.as_str().replace('_', ".").into(),
            }))
            // Environment variable aliases
            .merge(Env::raw().map(|v| match v.as_str() {
                "SERVICE_URL" => "backend.url".into(),
                "SERVICE_KEY" => "backend.api_key".into(),
                "MAILGUN_API_KEY" => "email.api_key".into(),
                _ => v.into(),
            }))
    }
}
