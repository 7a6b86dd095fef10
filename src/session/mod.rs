use tokio::sync::broadcast;

use crate::backend::{AuthUser, Session};

/// Auth-state change notifications, delivered to every live subscriber.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
}

/// Holds the session the hosted identity provider handed us and fans
/// out state changes over an explicit channel.
///
/// The session is observed, never minted or verified here. Subscribing
/// returns a receiver; dropping it is the whole unsubscribe lifecycle.
pub struct SessionWatcher {
    current: std::sync::RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SessionWatcher {
    const CHANNEL_CAPACITY: usize = 16;

    pub fn new() -> Self {
        let (events, _) = broadcast::channel(Self::CHANNEL_CAPACITY);
        Self {
            current: std::sync::RwLock::new(None),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub fn session(&self) -> Option<Session> {
        self.current.read().ok().and_then(|slot| slot.clone())
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.session().map(|session| session.user)
    }

    pub fn is_signed_in(&self) -> bool {
        self.current
            .read()
            .map(|slot| slot.is_some())
            .unwrap_or_default()
    }

    pub fn set_session(&self, session: Session) {
        if let Ok(mut slot) = self.current.write() {
            *slot = Some(session.clone());
        }
        // nobody listening is fine
        self.events.send(AuthEvent::SignedIn(session)).ok();
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.current.write() {
            *slot = None;
        }
        self.events.send(AuthEvent::SignedOut).ok();
    }
}

impl Default for SessionWatcher {
    fn default() -> Self {
        Self::new()
    }
}
