//! Session provider.
//!
//! Mirrors the auth backend's session lifecycle: the state starts as
//! `loading` until the provider resolves, then settles on either a signed-in
//! principal or signed-out. Consumers observe transitions through a watch
//! channel; subscriptions must not be attached while `loading` is true.

use tokio::sync::watch;

/// Current authentication state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    /// Opaque id of the authenticated principal, if any.
    pub principal_id: Option<String>,
    /// True until the auth provider has resolved the initial state.
    pub loading: bool,
}

impl SessionState {
    fn unresolved() -> Self {
        Self {
            principal_id: None,
            loading: true,
        }
    }
}

/// Emits the authenticated principal to the rest of the application.
pub struct Session {
    tx: watch::Sender<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::unresolved());
        Self { tx }
    }

    /// Resolves the session to a signed-in principal.
    pub fn sign_in(&self, principal_id: impl Into<String>) {
        let principal_id = principal_id.into();
        tracing::info!(target: "system", principal = %principal_id, "Session signed in");
        self.tx.send_replace(SessionState {
            principal_id: Some(principal_id),
            loading: false,
        });
    }

    /// Resolves the session to signed-out.
    pub fn sign_out(&self) {
        tracing::info!(target: "system", "Session signed out");
        self.tx.send_replace(SessionState {
            principal_id: None,
            loading: false,
        });
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Receiver observing every state transition.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
