//! Shutdown Signaling
//!
//! A cloneable trigger shared between the runtime, its components, and the
//! OS signal hooks. The first trigger wins; everything that waits on the
//! signal observes the same reason.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

/// Why the runtime is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Interrupt from the terminal (Ctrl-C / SIGINT).
    CtrlC,
    /// Termination request from the OS (SIGTERM).
    Terminate,
    /// Programmatic request through a `ShutdownSignal` handle.
    Requested,
}

impl std::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CtrlC => write!(f, "ctrl-c"),
            Self::Terminate => write!(f, "terminate"),
            Self::Requested => write!(f, "requested"),
        }
    }
}

/// Cloneable shutdown trigger.
///
/// All clones share one state. `trigger` is idempotent: the first reason is
/// kept and later calls are ignored, so a Ctrl-C racing a programmatic stop
/// cannot flip the recorded reason mid-shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<Option<ShutdownReason>>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown. The first call wins; the reason never changes after.
    pub fn trigger(&self, reason: ShutdownReason) {
        self.tx.send_if_modified(|state| {
            if state.is_none() {
                *state = Some(reason);
                true
            } else {
                false
            }
        });
    }

    pub fn is_triggered(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// The recorded reason, if shutdown has been requested.
    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.tx.borrow()
    }

    /// Wait until shutdown is requested. Resolves immediately when it already
    /// has been.
    pub async fn triggered(&self) -> ShutdownReason {
        let mut rx = self.tx.subscribe();
        loop {
            if let Some(reason) = *rx.borrow_and_update() {
                return reason;
            }
            // The sender lives inside `self`; the channel can only close
            // once every handle is gone.
            if rx.changed().await.is_err() {
                return ShutdownReason::Requested;
            }
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward Ctrl-C (and SIGTERM on Unix) to the given signal.
///
/// Failures to install a hook are logged and the runtime keeps going: a
/// process without OS hooks can still be stopped programmatically.
pub fn install_os_hooks(signal: &ShutdownSignal) {
    let signal = signal.clone();
    tokio::spawn(async move {
        let reason = wait_for_os_signal().await;
        info!(reason = %reason, event = "os_signal", "Shutdown signal received");
        signal.trigger(reason);
    });
}

#[cfg(unix)]
async fn wait_for_os_signal() -> ShutdownReason {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, event = "signal_hook_failed", "Could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, event = "signal_hook_failed", "Could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => ShutdownReason::CtrlC,
        _ = terminate => ShutdownReason::Terminate,
    }
}

#[cfg(not(unix))]
async fn wait_for_os_signal() -> ShutdownReason {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, event = "signal_hook_failed", "Could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    ShutdownReason::CtrlC
}
