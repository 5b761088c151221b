//! TCP Endpoint Component
//!
//! The one network listener the default scaffold wires. It binds the
//! configured address, holds the socket for the life of the application, and
//! closes accepted connections immediately: the scaffold speaks no protocol,
//! so there is nothing to serve yet. Binding failures surface as component
//! start errors and abort the boot.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::component::{Component, RuntimeContext};
use crate::error::ConfigError;
use crate::settings::Settings;

#[derive(Debug)]
pub struct TcpEndpoint {
    requested: SocketAddr,
    bound: OnceLock<SocketAddr>,
    accepted: Arc<AtomicU64>,
    close: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TcpEndpoint {
    /// Create an endpoint for the given address. Port 0 asks the OS for an
    /// ephemeral port; the actual one is available from `local_addr` once
    /// started.
    pub fn new(addr: SocketAddr) -> Self {
        let (close, _) = watch::channel(false);
        Self {
            requested: addr,
            bound: OnceLock::new(),
            accepted: Arc::new(AtomicU64::new(0)),
            close,
            task: Mutex::new(None),
        }
    }

    /// Create an endpoint bound to the configured `server.host`/`server.port`.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self::new(settings.socket_addr()?))
    }

    /// The address this endpoint was asked to bind.
    pub fn requested_addr(&self) -> SocketAddr {
        self.requested
    }

    /// The address actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.bound.get().copied()
    }

    /// Connections accepted (and closed) so far.
    pub fn connections_accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    async fn accept_loop(
        listener: TcpListenerStream,
        accepted: Arc<AtomicU64>,
        mut close: watch::Receiver<bool>,
    ) {
        let mut incoming = listener;
        loop {
            tokio::select! {
                changed = close.changed() => {
                    match changed {
                        Ok(()) if *close.borrow() => break,
                        Ok(()) => {}
                        Err(_) => break,
                    }
                }
                conn = incoming.next() => {
                    match conn {
                        Some(Ok(stream)) => {
                            accepted.fetch_add(1, Ordering::Relaxed);
                            debug!(
                                peer = ?stream.peer_addr().ok(),
                                event = "connection_closed",
                                "Accepted connection closed (no protocol wired)"
                            );
                            drop(stream);
                        }
                        Some(Err(err)) => {
                            warn!(error = %err, event = "accept_failed", "Failed to accept connection");
                        }
                        None => break,
                    }
                }
            }
        }
        debug!(event = "listener_drained", "TCP endpoint listener closed");
    }
}

#[async_trait]
impl Component for TcpEndpoint {
    async fn start(&self, _ctx: &RuntimeContext) -> Result<()> {
        if self.bound.get().is_some() {
            bail!("tcp endpoint already started");
        }

        // Try to bind the port first
        let listener = tokio::net::TcpListener::bind(self.requested)
            .await
            .map_err(|e| anyhow!("could not bind to {}: {}", self.requested, e))?;

        let local = listener.local_addr()?;
        let _ = self.bound.set(local);
        info!(addr = %local, event = "endpoint_bound", "TCP endpoint listening");

        let handle = tokio::spawn(Self::accept_loop(
            TcpListenerStream::new(listener),
            self.accepted.clone(),
            self.close.subscribe(),
        ));
        *self.task.lock().await = Some(handle);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let _ = self.close.send(true);
        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            handle
                .await
                .map_err(|e| anyhow!("tcp endpoint accept loop failed: {}", e))?;
        }
        Ok(())
    }
}
