// ABOUTME: Reload coordination - parse, validate, publish, or abort.
// ABOUTME: A failed reload keeps the previous snapshot serving untouched.

use crate::error::SourceError;
use crate::source::ConfigSource;
use muxgate_core::{SigningKeyHandle, Snapshot, SnapshotHandle};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Swaps freshly-parsed registries into the live snapshot handle.
///
/// Each pass runs parse, then validate (snapshot construction), then
/// publish. Any failure aborts the pass and the previously-published
/// snapshot stays in force; in-flight connections are never disturbed
/// either way because they hold their own snapshot reference. The
/// coordinator is only ever driven by external change notifications, never
/// by the decision engine.
pub struct ReloadCoordinator<S> {
    source: S,
    snapshots: SnapshotHandle,
    signing_key: Option<SigningKeyHandle>,
}

impl<S: ConfigSource> ReloadCoordinator<S> {
    pub fn new(source: S, snapshots: SnapshotHandle) -> Self {
        Self {
            source,
            snapshots,
            signing_key: None,
        }
    }

    /// Also hot-reload the host signing key into `handle` on each pass.
    pub fn with_signing_key(mut self, handle: SigningKeyHandle) -> Self {
        self.signing_key = Some(handle);
        self
    }

    /// Run one reload pass.
    ///
    /// The host signing key is an independent field with the same
    /// keep-previous policy: its failure is logged here but never blocks
    /// the registry publish, and a registry failure never blocks it because
    /// the pass aborts before reaching it.
    ///
    /// # Errors
    /// Any source failure; the caller decides whether that is fatal
    /// (startup) or merely logged (live reload).
    pub fn reload(&self) -> Result<(), SourceError> {
        let set = self.source.load()?;
        let snapshot = Snapshot::new(set.identities, set.hosts);
        info!(
            source = %self.source.describe(),
            identities = snapshot.identities().len(),
            hosts = snapshot.hosts().len(),
            "publishing new registries"
        );
        self.snapshots.publish(snapshot);

        if let Some(handle) = &self.signing_key {
            match self.source.load_host_key() {
                Ok(Some(key)) => handle.publish(key),
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, "host key reload failed, keeping previous key");
                }
            }
        }

        Ok(())
    }

    /// Serve reload requests until the notification channel closes.
    ///
    /// Each received unit is one "configuration changed" event; a failed
    /// pass is logged and the loop keeps serving later events.
    pub async fn run(self, mut changes: mpsc::Receiver<()>) {
        while changes.recv().await.is_some() {
            info!(source = %self.source.describe(), "configuration changed, reloading");
            if let Err(err) = self.reload() {
                warn!(
                    source = %self.source.describe(),
                    error = %err,
                    "reload aborted, keeping previous registries"
                );
            }
        }
    }
}
