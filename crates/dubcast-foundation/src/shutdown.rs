//! Ctrl-C driven cancellation via a `ShutdownHandler`/`ShutdownGuard` split:
//! `install()` spawns the signal
//! listener and panic hook once, returning a cheap, cloneable guard that
//! phases poll between I/O boundaries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

pub struct ShutdownHandler {
    requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandler {
    pub fn new() -> Self {
        Self {
            requested: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Spawns a ctrl-c listener and installs a panic hook that also marks
    /// shutdown requested, so a phase polling the guard from inside a
    /// panicking task still observes cancellation. Returns a `ShutdownGuard`
    /// cheap to clone into every phase.
    pub async fn install(self) -> ShutdownGuard {
        let requested = self.requested.clone();
        let notify = self.notify.clone();

        let requested_for_signal = requested.clone();
        let notify_for_signal = notify.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!(target: "dubcast::shutdown", "ctrl-c received, requesting shutdown");
                requested_for_signal.store(true, Ordering::SeqCst);
                notify_for_signal.notify_waiters();
            }
        });

        let requested_for_panic = requested.clone();
        let previous_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            requested_for_panic.store(true, Ordering::SeqCst);
            previous_hook(info);
        }));

        ShutdownGuard { requested, notify }
    }
}

#[derive(Clone)]
pub struct ShutdownGuard {
    requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownGuard {
    pub fn is_shutdown_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub async fn wait(&self) {
        self.notify.notified().await;
    }

    pub fn request_shutdown(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}
