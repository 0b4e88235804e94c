//! Termination signal listener.
//!
//! A background thread runs a current-thread tokio runtime that waits for
//! SIGINT or SIGTERM and raises a shared [`ShutdownSignal`].  The command
//! loop checks the flag between polls, so the strip is blanked from the
//! same thread that processes commands and the two paths never overlap.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, info, warn};

static HANDLERS_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Cloneable one-way latch: once triggered it stays triggered.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Spawn the signal listener thread.
    ///
    /// Only the first call in a process installs handlers; later calls
    /// return `false` and leave `self` untriggered by OS signals.
    pub fn install_os_handlers(&self) -> bool {
        if HANDLERS_INSTALLED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Signal handlers already installed");
            return false;
        }

        let signal = self.clone();
        let spawned = std::thread::Builder::new()
            .name("signal-listener".into())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!("Failed to create signal handler runtime: {}", e);
                        return;
                    }
                };
                rt.block_on(wait_for_signal());
                signal.trigger();
            });

        match spawned {
            Ok(_) => {
                info!("Installed SIGINT/SIGTERM handlers");
                true
            }
            Err(e) => {
                error!("Failed to spawn signal listener: {}", e);
                HANDLERS_INSTALLED.store(false, Ordering::SeqCst);
                false
            }
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(t), Ok(i)) => (t, i),
        (Err(e), _) | (_, Err(e)) => {
            error!("Cannot register signal handlers: {}", e);
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => warn!("Received SIGTERM, shutting down"),
        _ = sigint.recv() => warn!("Received SIGINT, shutting down"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => warn!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!("Cannot register Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
