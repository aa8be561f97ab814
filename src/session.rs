//! Per-submission session: correlation id plus cancellation handle.
//!
//! A [`Session`] is created when a submission starts and dropped when it
//! settles. Its id travels with `POST /convert` and `POST /cancel` so the
//! backend can match the two; its [`CancellationToken`] lets the client stop
//! waiting on the conversion request immediately.
//!
//! [`SessionSlot`] is the single place a controller keeps its active session.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Opaque per-submission correlation token (UUID v4 on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The active submission's id and its cancellation handle.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    token: CancellationToken,
}

impl Session {
    fn new() -> Self {
        Self {
            id: SessionId::new(),
            token: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Stop the local wait on the in-flight request.
    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Holds at most one active [`Session`].
#[derive(Debug, Default)]
pub struct SessionSlot {
    active: Option<Session>,
}

impl SessionSlot {
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    /// Start a new session, returning the one it displaced (if any).
    pub fn create(&mut self) -> (Session, Option<Session>) {
        let session = Session::new();
        let previous = self.active.replace(session.clone());
        (session, previous)
    }

    /// Clear the slot if it still holds `id`. Returns whether it did.
    ///
    /// Clearing an already-cleared or replaced session is a no-op, so
    /// cleanup can run from both the cancel path and the settle path.
    pub fn clear(&mut self, id: &SessionId) -> bool {
        if self.active.as_ref().is_some_and(|s| &s.id == id) {
            self.active = None;
            true
        } else {
            false
        }
    }

    /// Remove and return whatever session is active.
    pub fn take(&mut self) -> Option<Session> {
        self.active.take()
    }
}
