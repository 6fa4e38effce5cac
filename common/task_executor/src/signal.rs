use std::sync::Arc;
use tokio::sync::watch;

/// Dropping (or explicitly firing) this struct notifies every [`super::TaskExecutor`]
/// clone's spawned tasks to wind down at their next suspension point.
pub struct Signal {
    tx: Arc<watch::Sender<()>>,
}

impl Signal {
    pub(crate) fn new(tx: Arc<watch::Sender<()>>) -> Self {
        Self { tx }
    }

    /// Explicitly fires the shutdown signal. Equivalent to dropping this value.
    pub fn fire(self) {
        drop(self);
    }
}

impl Drop for Signal {
    fn drop(&mut self) {
        let _ = self.tx.send(());
    }
}
