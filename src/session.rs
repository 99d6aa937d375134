//! The logged in user's session and the events published when it changes.
//!
//! A [SessionContext] is created by the host application and handed to the
//! [RestExpenseService](crate::RestExpenseService), which attaches the access
//! token to every request. When the server rejects the token the session is
//! cleared and [SessionEvent::Expired] is published; what happens next (e.g.
//! showing the log-in screen) is up to whoever subscribed.

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use serde::Deserialize;
use tokio::sync::broadcast;

/// How many unread events a subscriber may fall behind by before it misses some.
const EVENT_CAPACITY: usize = 16;

/// The profile of the logged in user, as sent by the server at log-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    /// The server-assigned user ID.
    pub id: Option<i64>,
    /// The email address the user logs in with.
    pub email: String,
    /// The user's display name.
    pub user_name: Option<String>,
    /// The user's first name.
    pub first_name: Option<String>,
    /// The user's last name.
    pub last_name: Option<String>,
}

/// An access token and the user it belongs to.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
    user: UserProfile,
}

impl Session {
    /// Create a session for `user` authenticated by `access_token`.
    pub fn new(access_token: &str, user: UserProfile) -> Self {
        Self {
            access_token: access_token.to_owned(),
            user,
        }
    }

    /// The bearer token sent with every request.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The logged in user.
    pub fn user(&self) -> &UserProfile {
        &self.user
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"********")
            .field("user", &self.user)
            .finish()
    }
}

/// A change in the session's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user logged in.
    Established,
    /// The user logged out.
    Ended,
    /// The server rejected the session token.
    Expired,
}

/// Shared handle to the current session.
///
/// Cloning the handle shares the same session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    session: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// Create a context with nobody logged in.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            session: Arc::new(RwLock::new(None)),
            events,
        }
    }

    /// Receive every session event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Start a session, replacing any existing one.
    pub fn establish(&self, session: Session) {
        tracing::info!("Session established for {}", session.user().email);
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        self.publish(SessionEvent::Established);
    }

    /// End the session at the user's request.
    pub fn end(&self) {
        if self.take().is_some() {
            tracing::info!("Session ended");
            self.publish(SessionEvent::Ended);
        }
    }

    /// End the session because the server rejected `access_token`.
    ///
    /// Nothing happens unless `access_token` belongs to the current session, so
    /// a rejection of a token that was replaced by a later log in leaves the new
    /// session alone. Only the first rejection of a session publishes
    /// [SessionEvent::Expired], so concurrent requests failing together produce
    /// one event.
    pub fn expire(&self, access_token: &str) {
        let expired = {
            let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);

            if session
                .as_ref()
                .is_some_and(|session| session.access_token() == access_token)
            {
                session.take()
            } else {
                None
            }
        };

        if expired.is_some() {
            tracing::warn!("Session expired");
            self.publish(SessionEvent::Expired);
        } else {
            tracing::debug!("Ignoring the rejection of a token that is no longer in use");
        }
    }

    /// Whether someone is logged in.
    pub fn is_active(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The token to attach to requests, if someone is logged in.
    pub fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|session| session.access_token().to_owned())
    }

    /// The logged in user, if any.
    pub fn user(&self) -> Option<UserProfile> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|session| session.user().clone())
    }

    fn take(&self) -> Option<Session> {
        self.session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn publish(&self, event: SessionEvent) {
        // Sending only fails when nobody is subscribed.
        if self.events.send(event).is_err() {
            tracing::debug!("No subscribers for session event {event:?}");
        }
    }
}
