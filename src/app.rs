use error_stack::{Result, ResultExt};
use std::sync::Arc;
use thiserror::Error;

use crate::backend::{self, auth::SignUpOutcome, AuthUser, Session};
use crate::cache;
use crate::config;
use crate::email;
use crate::posts::{Composer, Feed, Manager};
use crate::session::SessionWatcher;

/// One running client: configuration, the hosted-service connection,
/// the read cache, and the observed auth state.
#[derive(Clone)]
pub struct App {
    pub config: Arc<config::Client>,
    pub backend: backend::Client,
    pub cache: Arc<cache::Store>,
    pub session: Arc<SessionWatcher>,
    feed: Feed<backend::Client>,
}

#[derive(Debug, Error)]
#[error("Failed to initialize App struct")]
pub struct AppError;

impl App {
    #[tracing::instrument(skip_all)]
    pub fn new(cfg: config::Client) -> Result<Self, AppError> {
        let backend = backend::Client::new(&cfg.backend).change_context(AppError)?;
        let cache = Arc::new(cache::Store::new(cfg.cache.dedup_window()));
        let session = Arc::new(SessionWatcher::new());
        let feed = Feed::new(
            Arc::new(backend.clone()),
            Arc::clone(&cache),
            Arc::new(cfg.cache.clone()),
        );

        Ok(Self {
            config: Arc::new(cfg),
            backend,
            cache,
            session,
            feed,
        })
    }

    pub fn feed(&self) -> &Feed<backend::Client> {
        &self.feed
    }

    pub fn composer(&self) -> Composer<backend::Client> {
        Composer::new(
            Arc::new(self.backend.clone()),
            Arc::clone(&self.cache),
            Arc::clone(&self.session),
            self.feed.clone(),
        )
    }

    pub fn manager(&self) -> Manager<backend::Client> {
        Manager::new(
            Arc::new(self.backend.clone()),
            Arc::clone(&self.cache),
            Arc::clone(&self.session),
        )
    }

    pub fn verifier(&self) -> Result<email::Verifier, AppError> {
        email::Verifier::new(&self.config.email).change_context(AppError)
    }
}

impl App {
    /// Registers a new account. When the provider hands a session back
    /// right away it is installed as the current one.
    #[tracing::instrument(skip_all)]
    pub async fn sign_up(&self, email: &str, password: &str) -> backend::Result<SignUpOutcome> {
        let outcome = self.backend.sign_up(email, password).await?;
        if let Some(session) = outcome.session.clone() {
            self.install_session(session);
        }
        Ok(outcome)
    }

    #[tracing::instrument(skip_all)]
    pub async fn sign_in(&self, email: &str, password: &str) -> backend::Result<Session> {
        let session = self.backend.sign_in(email, password).await?;
        self.install_session(session.clone());
        Ok(session)
    }

    /// The account the installed bearer credential belongs to, straight
    /// from the provider.
    #[tracing::instrument(skip_all)]
    pub async fn current_user(&self) -> backend::Result<AuthUser> {
        self.backend.current_user().await
    }

    /// Signs out at the provider and drops the local session either
    /// way; a dead session is not worth keeping because the network
    /// hiccuped.
    #[tracing::instrument(skip_all)]
    pub async fn sign_out(&self) -> backend::Result<()> {
        let result = self.backend.sign_out().await;
        self.backend.set_access_token(None);
        self.session.clear();
        result
    }

    fn install_session(&self, session: Session) {
        self.backend.set_access_token(Some(session.access_token.clone()));
        self.session.set_session(session);
    }
}
