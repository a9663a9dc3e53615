use std::sync::Arc;

use tokio::sync::watch;

/// Monotonic revision of the rendered workflow view.
///
/// Presentation layers compare the revision they rendered against
/// [`ViewRevision::current`] or wait on [`ViewRevision::subscribe`].
#[derive(Debug, Clone)]
pub struct ViewRevision {
    tx: Arc<watch::Sender<u64>>,
}

impl ViewRevision {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn current(&self) -> u64 {
        *self.tx.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    /// Marks the view at `path` stale and returns the new revision.
    pub fn invalidate(&self, path: &str) -> u64 {
        let mut revision = 0;
        self.tx.send_modify(|r| {
            *r += 1;
            revision = *r;
        });
        tracing::debug!(path, revision, "view invalidated");
        revision
    }
}

impl Default for ViewRevision {
    fn default() -> Self {
        Self::new()
    }
}
