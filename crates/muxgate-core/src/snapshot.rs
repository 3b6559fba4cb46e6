// ABOUTME: Immutable registry snapshots and their atomic publication handles.
// ABOUTME: Single writer (reload), many readers (connections), never torn.

use crate::model::{Host, Identity};
use ssh_key::PrivateKey;
use std::sync::{Arc, RwLock};

/// One immutable generation of the identity and host registries.
///
/// A snapshot is built whole during a reload and never mutated afterwards;
/// superseded generations are dropped once the last session holding them
/// finishes. Concurrent readers therefore need no locks on the contents.
#[derive(Debug)]
pub struct Snapshot {
    identities: Vec<Arc<Identity>>,
    hosts: Vec<Host>,
    has_defaults: bool,
}

impl Snapshot {
    /// Build a snapshot from freshly-parsed registries.
    ///
    /// `has_defaults` is derived here, so it can never drift from the host
    /// list it summarizes.
    pub fn new(identities: Vec<Identity>, hosts: Vec<Host>) -> Self {
        let has_defaults = hosts.iter().any(|h| h.no_auth);
        Self {
            identities: identities.into_iter().map(Arc::new).collect(),
            hosts,
            has_defaults,
        }
    }

    /// Registered identities, in configuration order.
    pub fn identities(&self) -> &[Arc<Identity>] {
        &self.identities
    }

    /// Registered hosts, in configuration order.
    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    /// True iff at least one host is a default/no-auth host.
    pub fn has_defaults(&self) -> bool {
        self.has_defaults
    }
}

/// Shared reference to the currently-published snapshot.
///
/// `publish` swaps the inner `Arc` wholesale, so a reader sees either the
/// fully-old or fully-new generation. A connection calls `current()` once
/// and keeps the returned `Arc` for its whole decision, which is what keeps
/// an authenticate/route pair from straddling a reload.
#[derive(Clone)]
pub struct SnapshotHandle {
    inner: Arc<RwLock<Arc<Snapshot>>>,
}

impl SnapshotHandle {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    /// The currently-published snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        self.inner.read().expect("snapshot lock poisoned").clone()
    }

    /// Atomically replace the published snapshot.
    pub fn publish(&self, snapshot: Snapshot) {
        *self.inner.write().expect("snapshot lock poisoned") = Arc::new(snapshot);
    }
}

/// Same publication pattern for the host signing key, which some
/// configuration sources hot-reload alongside the registries.
#[derive(Clone)]
pub struct SigningKeyHandle {
    inner: Arc<RwLock<Arc<PrivateKey>>>,
}

impl SigningKeyHandle {
    pub fn new(key: PrivateKey) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(key))),
        }
    }

    /// The currently-published signing key.
    pub fn current(&self) -> Arc<PrivateKey> {
        self.inner.read().expect("signing key lock poisoned").clone()
    }

    /// Atomically replace the published signing key.
    pub fn publish(&self, key: PrivateKey) {
        *self.inner.write().expect("signing key lock poisoned") = Arc::new(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssh_key::Algorithm;

    fn host(address: &str, users: &[&str], no_auth: bool) -> Host {
        Host {
            address: address.to_string(),
            users: users.iter().map(|u| u.to_string()).collect(),
            no_auth,
        }
    }

    #[test]
    fn test_has_defaults_false_without_noauth_hosts() {
        let snapshot = Snapshot::new(vec![], vec![host("a:22", &["alice"], false)]);
        assert!(!snapshot.has_defaults());
    }

    #[test]
    fn test_has_defaults_true_with_noauth_host() {
        let snapshot = Snapshot::new(
            vec![],
            vec![host("a:22", &["alice"], false), host("pub:22", &[], true)],
        );
        assert!(snapshot.has_defaults());
    }

    #[test]
    fn test_publish_replaces_current() {
        let handle = SnapshotHandle::new(Snapshot::new(vec![], vec![]));
        assert_eq!(handle.current().hosts().len(), 0);

        handle.publish(Snapshot::new(vec![], vec![host("a:22", &[], true)]));
        assert_eq!(handle.current().hosts().len(), 1);
        assert!(handle.current().has_defaults());
    }

    #[test]
    fn test_pinned_reference_survives_publish() {
        let handle = SnapshotHandle::new(Snapshot::new(vec![], vec![host("old:22", &[], true)]));
        let pinned = handle.current();

        handle.publish(Snapshot::new(vec![], vec![]));

        // The session that grabbed the old generation still sees it whole.
        assert_eq!(pinned.hosts()[0].address, "old:22");
        assert_eq!(handle.current().hosts().len(), 0);
    }

    #[test]
    fn test_handle_clones_share_publications() {
        let handle = SnapshotHandle::new(Snapshot::new(vec![], vec![]));
        let reader = handle.clone();

        handle.publish(Snapshot::new(vec![], vec![host("a:22", &[], true)]));
        assert_eq!(reader.current().hosts().len(), 1);
    }

    #[test]
    fn test_signing_key_publish() {
        let first = ssh_key::PrivateKey::random(&mut rand::thread_rng(), Algorithm::Ed25519)
            .expect("should generate ed25519 key");
        let second = ssh_key::PrivateKey::random(&mut rand::thread_rng(), Algorithm::Ed25519)
            .expect("should generate ed25519 key");
        let second_pub = second.public_key().clone();

        let handle = SigningKeyHandle::new(first);
        handle.publish(second);

        assert_eq!(
            handle.current().public_key().key_data(),
            second_pub.key_data()
        );
    }
}
