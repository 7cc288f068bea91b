// ── Snapshot store ──
//
// Holds the latest published snapshot behind a `watch` channel. Readers
// take a cheap `Arc` clone; a refresh swaps the whole snapshot in one
// send, so nobody observes a half-updated one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::Snapshot;
use crate::stream::SnapshotStream;

/// Latest snapshot of one firewall plus change notification.
pub struct SnapshotStore {
    current: watch::Sender<Arc<Snapshot>>,
    /// Bumped on every publish.
    version: watch::Sender<u64>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (current, _) = watch::channel(Arc::new(Snapshot::default()));
        let (version, _) = watch::channel(0u64);
        Self { current, version }
    }

    /// The current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.borrow().clone()
    }

    /// Subscribe to snapshot replacements.
    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.current.subscribe())
    }

    /// Number of snapshots published so far.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// When the published snapshot was taken, if one has been published.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        (self.version() > 0).then(|| self.current.borrow().refreshed_at)
    }

    /// Replace the published snapshot and notify subscribers.
    pub(crate) fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        // `send_replace` updates unconditionally, even with zero receivers.
        self.current.send_replace(Arc::clone(&snapshot));
        self.version.send_modify(|v| *v += 1);
        snapshot
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
