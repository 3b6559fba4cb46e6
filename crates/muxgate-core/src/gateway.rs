// ABOUTME: Callback surface consumed by the external SSH multiplexer.
// ABOUTME: Pins one snapshot per connection so auth and routing never straddle a reload.

use crate::engine::{self, AuthOutcome};
use crate::error::CoreError;
use crate::model::Identity;
use crate::snapshot::{Snapshot, SnapshotHandle};
use ssh_key::PublicKey;
use std::sync::Arc;
use tracing::{info, warn};

/// Connection metadata supplied by the SSH collaborator, used for audit logs.
#[derive(Debug, Clone)]
pub struct ConnMeta {
    /// Remote peer address as reported by the transport.
    pub remote_addr: String,
    /// Username the client asked for at the transport level.
    pub username: String,
}

/// One connection's decision state: the pinned snapshot, the resolved
/// outcome, and the candidate backends filled in by `session_setup`.
pub struct Session {
    snapshot: Arc<Snapshot>,
    outcome: AuthOutcome,
    meta: ConnMeta,
    /// Ordered backend candidates for the collaborator's host selection.
    pub remotes: Vec<String>,
}

impl Session {
    /// The resolved authentication outcome.
    pub fn outcome(&self) -> &AuthOutcome {
        &self.outcome
    }

    /// The bound identity, or `None` for anonymous sessions.
    pub fn identity(&self) -> Option<&Arc<Identity>> {
        self.outcome.identity()
    }

    /// Metadata of the connection this session belongs to.
    pub fn meta(&self) -> &ConnMeta {
        &self.meta
    }
}

/// The decision engine as seen by the SSH multiplexer.
///
/// The collaborator calls `authenticate` once per connection attempt and
/// `session_setup` once per accepted session. Both operate on the snapshot
/// pinned at authentication time; reloads only affect later connections.
#[derive(Clone)]
pub struct Gateway {
    snapshots: SnapshotHandle,
}

impl Gateway {
    pub fn new(snapshots: SnapshotHandle) -> Self {
        Self { snapshots }
    }

    /// Authentication callback, invoked once per connection attempt.
    ///
    /// Acquires the current snapshot and keeps it inside the returned
    /// session, so the later `session_setup` call routes against the same
    /// generation even if a reload lands in between.
    ///
    /// # Errors
    /// `CoreError::AccessDenied` when the key matches nothing and no
    /// default hosts exist; the denial is logged with the remote address
    /// and attempted username for audit.
    pub fn authenticate(
        &self,
        meta: &ConnMeta,
        presented: &PublicKey,
    ) -> Result<Session, CoreError> {
        let snapshot = self.snapshots.current();
        match engine::authenticate(&snapshot, presented) {
            Ok(outcome) => Ok(Session {
                snapshot,
                outcome,
                meta: meta.clone(),
                remotes: Vec::new(),
            }),
            Err(err) => {
                warn!(
                    remote = %meta.remote_addr,
                    username = %meta.username,
                    "access denied"
                );
                Err(err)
            }
        }
    }

    /// Session setup callback, invoked once per accepted session.
    ///
    /// Populates the session's candidate remotes. An empty list is a valid
    /// outcome the collaborator must surface as "nothing to route to"
    /// rather than a failure of the engine.
    pub fn session_setup(&self, session: &mut Session) -> Result<(), CoreError> {
        session.remotes = engine::route(&session.snapshot, &session.outcome);
        info!(
            remote = %session.meta.remote_addr,
            user = session.outcome.display_name(),
            username = %session.meta.username,
            candidates = session.remotes.len(),
            "authorized"
        );
        Ok(())
    }

    /// Audit hook for the collaborator to report which backend it picked.
    pub fn selected(&self, session: &Session, remote: &str) {
        info!(
            remote = %session.meta.remote_addr,
            user = session.outcome.display_name(),
            backend = remote,
            "connecting"
        );
    }
}
