use chrono::{DateTime, Utc};
use error_stack::ResultExt;
use serde::Deserialize;

use super::{reject, Client, Error, ErrorExt, Result};

/// Identity as the provider reports it. Observed only; this crate never
/// creates or verifies credentials.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(alias = "email_confirmed_at")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AuthUser,
}

/// What a sign-up produced. The provider withholds the session when the
/// address still needs to be confirmed.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: Option<AuthUser>,
    pub session: Option<Session>,
}

impl SignUpOutcome {
    pub fn needs_confirmation(&self) -> bool {
        self.session.is_none()
    }
}

#[derive(Debug, serde::Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl Client {
    #[tracing::instrument(skip_all, name = "backend.auth.sign_up")]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let url = self.endpoint("auth/v1/signup")?;
        let response = self
            .http()
            .post(url)
            .bearer_auth(self.bearer())
            .json(&Credentials { email, password })
            .send()
            .await
            .into_backend_error()?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        // The payload is the bare user object when confirmation is
        // pending, or a full token response otherwise.
        let value = response
            .json::<serde_json::Value>()
            .await
            .into_backend_error()?;

        if value.get("access_token").is_some() {
            let session =
                serde_json::from_value::<Session>(value).change_context(Error::Decode)?;
            Ok(SignUpOutcome {
                user: Some(session.user.clone()),
                session: Some(session),
            })
        } else {
            let user = serde_json::from_value::<AuthUser>(value).change_context(Error::Decode)?;
            Ok(SignUpOutcome {
                user: Some(user),
                session: None,
            })
        }
    }

    #[tracing::instrument(skip_all, name = "backend.auth.sign_in")]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .http()
            .post(url)
            .bearer_auth(self.bearer())
            .json(&Credentials { email, password })
            .send()
            .await
            .into_backend_error()?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        response.json::<Session>().await.into_backend_error()
    }

    /// Asks the provider who the current bearer credential belongs to.
    /// This is the authoritative session check; [`crate::session`] only
    /// mirrors what was last observed locally.
    #[tracing::instrument(skip_all, name = "backend.auth.current_user")]
    pub async fn current_user(&self) -> Result<AuthUser> {
        let url = self.endpoint("auth/v1/user")?;
        let response = self
            .http()
            .get(url)
            .bearer_auth(self.bearer())
            .send()
            .await
            .into_backend_error()?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        response.json::<AuthUser>().await.into_backend_error()
    }

    #[tracing::instrument(skip_all, name = "backend.auth.sign_out")]
    pub async fn sign_out(&self) -> Result<()> {
        let url = self.endpoint("auth/v1/logout")?;
        let response = self
            .http()
            .post(url)
            .bearer_auth(self.bearer())
            .send()
            .await
            .into_backend_error()?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ErrorExt2;
    use crate::config;

    fn unreachable_client() -> Client {
        // nothing listens on the discard port
        let cfg: config::Backend = serde_json::from_value(serde_json::json!({
            "url": "http://127.0.0.1:9",
            "api_key": "anon-key",
            "timeout_secs": 1,
        }))
        .unwrap();
        Client::new(&cfg).unwrap()
    }

    #[tokio::test]
    async fn current_user_reports_an_unreachable_provider() {
        let client = unreachable_client();
        let report = client.current_user().await.unwrap_err();
        assert!(report.is_unavailable());
    }
}
