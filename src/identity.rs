//! Identity collaborator contract
//!
//! The store never talks to an authentication provider itself; it only needs
//! a stable opaque owner id and a readiness signal. This module is the typed
//! feed an external sign-in flow drives: `AuthSession` is held by whoever
//! completes authentication, and the store watches the receiving side.

use tokio::sync::watch;

/// ---------------------------------------------------------------------------
/// Auth State
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
  /// No owner yet, or the user signed out. All store operations are refused
  /// and live subscriptions end.
  #[default]
  SignedOut,
  /// Authenticated and ready; every record is scoped to this owner.
  Ready { owner_id: String },
}

impl AuthState {
  pub fn owner_id(&self) -> Option<&str> {
    match self {
      AuthState::Ready { owner_id } => Some(owner_id),
      AuthState::SignedOut => None,
    }
  }

  pub fn is_ready(&self) -> bool {
    matches!(self, AuthState::Ready { .. })
  }
}

/// ---------------------------------------------------------------------------
/// Auth Session
/// ---------------------------------------------------------------------------

/// Writer half of the identity feed.
pub struct AuthSession {
  tx: watch::Sender<AuthState>,
}

impl AuthSession {
  /// Create a feed starting in the signed-out state.
  pub fn new() -> (Self, watch::Receiver<AuthState>) {
    let (tx, rx) = watch::channel(AuthState::SignedOut);
    (Self { tx }, rx)
  }

  pub fn sign_in(&self, owner_id: impl Into<String>) {
    let _ = self.tx.send(AuthState::Ready {
      owner_id: owner_id.into(),
    });
  }

  pub fn sign_out(&self) {
    let _ = self.tx.send(AuthState::SignedOut);
  }

  pub fn subscribe(&self) -> watch::Receiver<AuthState> {
    self.tx.subscribe()
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
