//! Graceful shutdown
//!
//! Session loops hold a child of the controller's cancellation token and a
//! [`SessionGuard`]. Shutting down cancels the token, which sends every loop
//! into its normal teardown, then waits (bounded) for the guards to drop.
//!
//! ```ignore
//! let shutdown = ShutdownController::new();
//! let engine = TerminalEngine::new(..).with_shutdown(shutdown.token());
//!
//! let _guard = shutdown.register_session();
//! engine.run(&id, sink, stream).await;
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default time to wait for sessions to finish tearing down
const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 10;

/// Coordinates server shutdown across session loops
pub struct ShutdownController {
    cancel_token: CancellationToken,
    initiated: AtomicBool,
    active_sessions: AtomicU32,
    drain_timeout: Duration,
}

impl ShutdownController {
    /// Create a controller with the default drain timeout
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::with_drain_timeout(Duration::from_secs(DEFAULT_DRAIN_TIMEOUT_SECS))
    }

    /// Create a controller with a custom drain timeout
    #[must_use]
    pub fn with_drain_timeout(drain_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            cancel_token: CancellationToken::new(),
            initiated: AtomicBool::new(false),
            active_sessions: AtomicU32::new(0),
            drain_timeout,
        })
    }

    /// Token cancelled when shutdown begins
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    /// Whether shutdown has begun
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.initiated.load(Ordering::SeqCst)
    }

    /// Count a session loop as active until the guard drops
    pub fn register_session(self: &Arc<Self>) -> SessionGuard {
        self.active_sessions.fetch_add(1, Ordering::SeqCst);
        SessionGuard {
            controller: Arc::clone(self),
        }
    }

    /// Session loops still running
    #[must_use]
    pub fn active_sessions(&self) -> u32 {
        self.active_sessions.load(Ordering::SeqCst)
    }

    /// Cancel every session and wait for them to tear down.
    ///
    /// Only the first call does anything.
    pub async fn shutdown(&self) {
        if self
            .initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Shutdown already initiated");
            return;
        }

        info!("Initiating graceful shutdown...");
        self.cancel_token.cancel();

        let started = std::time::Instant::now();
        loop {
            let active = self.active_sessions();
            if active == 0 {
                info!("All sessions closed");
                break;
            }
            if started.elapsed() >= self.drain_timeout {
                warn!(
                    active_sessions = active,
                    timeout_secs = self.drain_timeout.as_secs(),
                    "Drain timeout exceeded"
                );
                break;
            }
            debug!(active_sessions = active, "Waiting for sessions to close...");
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        info!("Graceful shutdown complete");
    }
}

/// Marks one running session loop
pub struct SessionGuard {
    controller: Arc<ShutdownController>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.controller.active_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Wait for Ctrl+C or SIGTERM
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
