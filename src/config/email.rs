use error_stack::{Result, ResultExt};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Email-quality heuristics and the external verification service.
///
/// The fake-prefix and typo tables are plain configuration data; the
/// checker only consumes whatever lists end up here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Email {
    /// Base URL of the address verification service.
    ///
    /// **Environment variables**:
    /// - `QUILL_EMAIL_VERIFY_URL`
    pub verify_url: String,
    /// Credential for the verification service. Verification is skipped
    /// entirely when unset.
    ///
    /// **Environment variables**:
    /// - `QUILL_EMAIL_API_KEY` or `MAILGUN_API_KEY`
    pub api_key: Option<String>,
    /// Local-part prefixes that flag an address as likely fake
    /// (`test@…`, `admin@…` and friends). Matched case-insensitively.
    pub fake_prefixes: Vec<String>,
    /// Domain misspellings mapped to the domain the user probably meant.
    pub domain_typos: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
#[error("Invalid email configuration")]
pub struct InvalidEmail;

impl Default for Email {
    fn default() -> Self {
        Self {
            verify_url: "https://api.mailgun.net".to_string(),
            api_key: None,
            fake_prefixes: Self::default_fake_prefixes(),
            domain_typos: Self::default_domain_typos(),
        }
    }
}

impl Email {
    pub(crate) fn validate(&self) -> Result<(), InvalidEmail> {
        url::Url::parse(&self.verify_url)
            .change_context(InvalidEmail)
            .attach_printable("`email.verify_url` must be a valid URL")?;
        Ok(())
    }

    fn default_fake_prefixes() -> Vec<String> {
        [
            "test", "fake", "temp", "tmp", "example", "demo", "sample", "dummy", "invalid",
            "noreply", "no-reply", "admin", "info", "contact", "hello", "hi", "user", "guest",
            "anonymous", "unknown", "random", "123", "abc", "xyz", "qwerty", "asdf", "password",
            "email", "mail",
        ]
        .into_iter()
        .map(str::to_string)
        .collect()
    }

    fn default_domain_typos() -> BTreeMap<String, String> {
        [
            ("gmial.com", "gmail.com"),
            ("gmal.com", "gmail.com"),
            ("gmeil.com", "gmail.com"),
            ("gmil.com", "gmail.com"),
            ("gamil.com", "gmail.com"),
            ("gmai.com", "gmail.com"),
            ("yaho.com", "yahoo.com"),
            ("yhoo.com", "yahoo.com"),
            ("yahooo.com", "yahoo.com"),
            ("yhaoo.com", "yahoo.com"),
            ("hotmai.com", "hotmail.com"),
            ("hotmial.com", "hotmail.com"),
            ("outlok.com", "outlook.com"),
            ("outllok.com", "outlook.com"),
        ]
        .into_iter()
        .map(|(typo, fix)| (typo.to_string(), fix.to_string()))
        .collect()
    }
}
