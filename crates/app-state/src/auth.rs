//! Authentication status tracking
//!
//! This module provides the live, three-valued authentication status observed by
//! auth gates, and a watch-backed store that publishes it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;

/// The signed-in user's identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Stable account identifier (DID)
    pub did: String,
    /// Human-readable handle
    pub handle: String,
}

impl Identity {
    /// Create a new identity
    pub fn new(did: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            handle: handle.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.handle, self.did)
    }
}

/// Current authentication status
///
/// Exactly one value is current at any instant. Transitions are pushed by an
/// [`AuthStateSource`], never polled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthStatus {
    /// The initial status has not been resolved yet
    #[default]
    Loading,
    /// A user is signed in
    Authenticated(Identity),
    /// No user is signed in
    Unauthenticated,
}

impl AuthStatus {
    /// Get the identity if authenticated
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthStatus::Authenticated(identity) => Some(identity),
            AuthStatus::Loading | AuthStatus::Unauthenticated => None,
        }
    }

    /// Check if a user is signed in
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Authenticated(_))
    }

    /// Check if the status has left `Loading`
    pub fn is_resolved(&self) -> bool {
        !matches!(self, AuthStatus::Loading)
    }
}

/// A live source of [`AuthStatus`]
///
/// Implementations own the status and publish every transition to subscribers.
pub trait AuthStateSource: Send + Sync {
    /// Subscribe to status changes
    ///
    /// The receiver starts out holding the current status.
    fn subscribe(&self) -> watch::Receiver<AuthStatus>;

    /// Read the current status
    fn current(&self) -> AuthStatus {
        self.subscribe().borrow().clone()
    }
}

/// Watch-backed [`AuthStateSource`]
///
/// # Example
///
/// ```
/// use app_state::auth::{AuthStateSource, AuthStatus, AuthStatusStore, Identity};
///
/// let store = AuthStatusStore::new();
/// assert_eq!(store.current(), AuthStatus::Loading);
///
/// store.set_authenticated(Identity::new("did:plc:alice", "alice.test"));
/// assert!(store.current().is_authenticated());
/// ```
#[derive(Debug)]
pub struct AuthStatusStore {
    tx: watch::Sender<AuthStatus>,
}

impl AuthStatusStore {
    /// Create a store in the `Loading` state
    pub fn new() -> Self {
        Self::with_status(AuthStatus::Loading)
    }

    /// Create a store with an initial status
    pub fn with_status(status: AuthStatus) -> Self {
        let (tx, _) = watch::channel(status);
        Self { tx }
    }

    /// Publish a new status
    ///
    /// Subscribers are only notified when the status actually changes.
    /// Returns whether it changed.
    pub fn set(&self, status: AuthStatus) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });

        if changed {
            tracing::debug!(status = ?*self.tx.borrow(), "auth status changed");
        }

        changed
    }

    /// Mark a user as signed in
    pub fn set_authenticated(&self, identity: Identity) -> bool {
        self.set(AuthStatus::Authenticated(identity))
    }

    /// Mark the user as signed out
    pub fn set_unauthenticated(&self) -> bool {
        self.set(AuthStatus::Unauthenticated)
    }

    /// Return to the unresolved state (e.g. while a session is being restored)
    pub fn set_loading(&self) -> bool {
        self.set(AuthStatus::Loading)
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for AuthStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStateSource for AuthStatusStore {
    fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.tx.subscribe()
    }

    fn current(&self) -> AuthStatus {
        self.tx.borrow().clone()
    }
}
