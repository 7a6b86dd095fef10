use error_stack::{Result, ResultExt};
use serde::Deserialize;
use thiserror::Error;

use super::{is_valid_email_format, Checker};
use crate::config;

/// What the deliverability service says about one address.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    pub address: Option<String>,
    #[serde(default)]
    pub is_disposable_address: bool,
    #[serde(default)]
    pub is_role_address: bool,
    #[serde(default)]
    pub reason: Vec<String>,
    pub result: String,
    #[serde(default)]
    pub risk: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub is_valid: bool,
    pub error: Option<String>,
}

impl Verdict {
    fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Error)]
#[error("Failed to initialize email verifier")]
pub struct VerifierError;

/// Local heuristics followed by the external deliverability lookup.
///
/// The remote step fails open: an unreachable or misbehaving service
/// must never block a registration. Availability over strictness is the
/// policy here, not an accident.
pub struct Verifier {
    checker: Checker,
    http: reqwest::Client,
    verify_url: String,
    api_key: Option<String>,
}

impl Verifier {
    pub fn new(cfg: &config::Email) -> Result<Self, VerifierError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .change_context(VerifierError)?;

        Ok(Self {
            checker: Checker::new(cfg),
            http,
            verify_url: cfg.verify_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        })
    }

    #[tracing::instrument(skip(self), name = "email.verify")]
    pub async fn verify(&self, email: &str) -> Verdict {
        if let Some(message) = self.checker.check(email) {
            return Verdict::invalid(message);
        }

        // catches the empty input the checker lets through
        if !is_valid_email_format(email) {
            return Verdict::invalid("Please enter a valid email address format");
        }

        self.verify_remote(email).await
    }

    async fn verify_remote(&self, email: &str) -> Verdict {
        // no credential, no lookup
        let Some(api_key) = self.api_key.as_deref() else {
            return Verdict::valid();
        };

        let url = format!("{}/v4/address/validate", self.verify_url);
        let response = self
            .http
            .get(url)
            .basic_auth("api", Some(api_key))
            .query(&[("address", email)])
            .send()
            .await;

        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!(
                    status = %response.status(),
                    "email verification answered with an error status, failing open"
                );
                return Verdict::valid();
            }
            Err(error) => {
                tracing::warn!(%error, "email verification service unreachable, failing open");
                return Verdict::valid();
            }
        };

        match response.json::<VerifyResponse>().await {
            Ok(data) => interpret(&data),
            Err(error) => {
                tracing::warn!(%error, "undecodable verification payload, failing open");
                Verdict::valid()
            }
        }
    }
}

/// Maps a successful lookup to a verdict.
pub(crate) fn interpret(data: &VerifyResponse) -> Verdict {
    if data.result == "deliverable" {
        if data.is_disposable_address {
            return Verdict::invalid("Disposable email addresses are not allowed");
        }
        if data.is_role_address {
            return Verdict::invalid(
                "Role-based email addresses (admin@, info@, etc.) are not allowed",
            );
        }
        return Verdict::valid();
    }

    match data.result.as_str() {
        "undeliverable" => Verdict::invalid("This email address appears to be invalid"),
        "unknown" => Verdict::invalid("Unable to verify this email address"),
        "risky" => Verdict::invalid("This email address appears to be risky or invalid"),
        _ => Verdict::invalid("Email validation failed"),
    }
}
