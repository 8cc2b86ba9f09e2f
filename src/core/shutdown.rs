//! Signal-driven shutdown coordination
//!
//! The binary runs its scan under `ShutdownCoordinator::guard_with_coordinator`; the
//! first SIGINT/SIGTERM (or Ctrl-C) is broadcast so the live session can be cancelled
//! and torn down, a second one exits immediately with status 130.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Broadcasts a single shutdown request to every subscriber
pub struct ShutdownCoordinator {
    pub shutdown_tx: broadcast::Sender<()>,
    pub shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> (Self, broadcast::Receiver<()>) {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(8);
        let coordinator = Self {
            shutdown_tx,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        };
        (coordinator, shutdown_rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Install signal handlers, then run `future_fn` with the coordinator and a receiver
    pub async fn guard_with_coordinator<F, Fut, R>(future_fn: F) -> R
    where
        F: FnOnce(Self, broadcast::Receiver<()>) -> Fut,
        Fut: std::future::Future<Output = R>,
    {
        let (coordinator, shutdown_rx) = Self::new();
        setup_signal_handlers(
            coordinator.shutdown_tx.clone(),
            coordinator.shutdown_requested.clone(),
        );
        future_fn(coordinator, shutdown_rx).await
    }
}

fn record_signal(
    tx: &broadcast::Sender<()>,
    requested: &AtomicBool,
    signal_count: &AtomicUsize,
) {
    let prev = signal_count.fetch_add(1, Ordering::AcqRel);
    requested.store(true, Ordering::Release);
    let _ = tx.send(());
    if prev >= 1 {
        log::warn!("Second interrupt received; exiting without teardown");
        std::process::exit(130);
    }
    log::info!("Interrupt received; cancelling scan");
}

fn setup_signal_handlers(shutdown_tx: broadcast::Sender<()>, shutdown_requested: Arc<AtomicBool>) {
    let signal_count = Arc::new(AtomicUsize::new(0));

    #[cfg(unix)]
    {
        // Restore default SIGPIPE so piping the JSON outcome into `head` ends quietly
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }

        use tokio::signal::unix::{signal, SignalKind};
        for kind in [SignalKind::terminate(), SignalKind::hangup()] {
            let tx = shutdown_tx.clone();
            let requested = shutdown_requested.clone();
            let counter = signal_count.clone();
            tokio::spawn(async move {
                if let Ok(mut sig) = signal(kind) {
                    while sig.recv().await.is_some() {
                        record_signal(&tx, &requested, &counter);
                    }
                }
            });
        }
    }

    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            record_signal(&shutdown_tx, &shutdown_requested, &signal_count);
        }
    });
}
