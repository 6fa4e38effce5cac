//! A handle for spawning tasks that are automatically cancelled when the
//! process begins shutting down, and which tag every spawned future with a
//! name for diagnostics.
//!
//! Every long-lived loop in the proposal pipeline, registration scheduler,
//! and discovery service is spawned through a `TaskExecutor` rather than a
//! bare `tokio::spawn`, so a single shutdown signal reaches all of them.

use futures::channel::mpsc::Sender as ExitSender;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;

mod signal;

pub use signal::Signal;

/// A wrapper around a tokio runtime handle plus a shutdown signal, cloned
/// into every service that needs to spawn background work.
#[derive(Clone)]
pub struct TaskExecutor {
    handle: Handle,
    exit: watch::Receiver<()>,
    /// Kept alive so that `exit` only fires when every clone is dropped, not
    /// when the originating struct is dropped while a clone is still live.
    _signal_tx: Arc<watch::Sender<()>>,
}

impl TaskExecutor {
    pub fn new(handle: Handle) -> (Self, Signal) {
        let (signal_tx, exit) = watch::channel(());
        let signal_tx = Arc::new(signal_tx);
        (
            Self {
                handle,
                exit,
                _signal_tx: signal_tx.clone(),
            },
            Signal::new(signal_tx),
        )
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Returns a clone of the exit watch so callers can `select!` against it
    /// directly inside a custom loop (e.g. the discovery random-walk loop).
    pub fn exit(&self) -> watch::Receiver<()> {
        self.exit.clone()
    }

    /// Spawns a future that runs until completion or until the shutdown
    /// signal fires, whichever comes first.
    pub fn spawn<F>(&self, future: F, name: &'static str)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut exit = self.exit();
        self.handle.spawn(async move {
            tokio::select! {
                () = future => {}
                _ = exit.changed() => {
                    tracing::debug!(task = name, "task shut down via exit signal");
                }
            }
        });
    }

    /// As [`Self::spawn`], but for a fallible future whose error is logged
    /// rather than propagated — used for one-shot tasks (e.g. a single
    /// slot's block-proposal attempt) whose caller has no one to report to.
    pub fn spawn_ignoring_error<F, E>(&self, future: F, name: &'static str)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: std::fmt::Debug + Send + 'static,
    {
        self.spawn(
            async move {
                if let Err(e) = future.await {
                    tracing::debug!(task = name, error = ?e, "task exited with error");
                }
            },
            name,
        );
    }

    /// Spawns a future and hands back a [`tokio::task::JoinHandle`] so the
    /// caller can await its result directly.
    pub fn spawn_handle<F, R>(&self, future: F, name: &'static str) -> tokio::task::JoinHandle<Option<R>>
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        let mut exit = self.exit();
        self.handle.spawn(async move {
            tokio::select! {
                result = future => Some(result),
                _ = exit.changed() => {
                    tracing::debug!(task = name, "task shut down via exit signal");
                    None
                }
            }
        })
    }
}

/// Placeholder retained for API parity with callers that pass an
/// `mpsc::Sender<()>` shutdown channel rather than polling [`TaskExecutor::exit`] directly.
pub type ShutdownSender = ExitSender<()>;
