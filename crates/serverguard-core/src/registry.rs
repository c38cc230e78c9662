//! Session and connection registries
//!
//! [`SessionRegistry`] maps caller-supplied session ids to live session
//! state, one map per session family. An entry is created when a client
//! attaches and removed only by the connection that created it, together
//! with the teardown of whatever the session owns.
//!
//! [`ConnectionRegistry`] tracks every open transport, whether or not it has
//! a session yet, so server-wide notices can be broadcast.

use crate::error::{Error, Result};
use crate::screen::session::{ScreenSession, ScreenSettings};
use crate::terminal::session::{SharedTerminalSession, TerminalSession};
use crate::transport::SharedSink;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Live sessions by id
#[derive(Default)]
pub struct SessionRegistry {
    terminals: RwLock<HashMap<String, SharedTerminalSession>>,
    screens: RwLock<HashMap<String, Arc<ScreenSession>>>,
}

impl SessionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the terminal session `id` with `create`.
    ///
    /// Fails with [`Error::SessionInUse`] while another connection holds `id`.
    pub async fn attach_terminal<F>(&self, id: &str, create: F) -> Result<SharedTerminalSession>
    where
        F: FnOnce() -> TerminalSession,
    {
        let mut terminals = self.terminals.write().await;
        if terminals.contains_key(id) {
            return Err(Error::SessionInUse(id.to_string()));
        }

        let session = Arc::new(Mutex::new(create()));
        terminals.insert(id.to_string(), session.clone());
        info!(session_id = %id, "Created new terminal session");
        Ok(session)
    }

    /// Look up a terminal session
    pub async fn terminal(&self, id: &str) -> Option<SharedTerminalSession> {
        self.terminals.read().await.get(id).cloned()
    }

    /// Remove `owner` from the registry and release what it owns.
    ///
    /// Marks the session disconnected and terminates its running command
    /// while the map is still locked, so no other caller can observe a
    /// removed session with a live process. Returns `false` if `id` is not
    /// (or no longer) mapped to `owner`.
    pub async fn close_terminal(&self, id: &str, owner: &SharedTerminalSession) -> bool {
        let mut terminals = self.terminals.write().await;
        match terminals.get(id) {
            Some(current) if Arc::ptr_eq(current, owner) => {}
            _ => return false,
        }
        terminals.remove(id);

        let mut session = owner.lock().await;
        session.set_connected(false);
        if let Some(process) = session.take_active_process() {
            if process.is_running() {
                process.terminate();
                info!(session_id = %id, pid = ?process.pid(), "Terminated process for session");
            }
        }
        info!(session_id = %id, "Cleaned up terminal session");
        true
    }

    /// Number of live terminal sessions
    pub async fn terminal_count(&self) -> usize {
        self.terminals.read().await.len()
    }

    /// Ids of live terminal sessions
    pub async fn terminal_ids(&self) -> Vec<String> {
        self.terminals.read().await.keys().cloned().collect()
    }

    /// Create the screen session `id` with `defaults`.
    ///
    /// Fails with [`Error::SessionInUse`] while another connection holds `id`.
    pub async fn attach_screen(&self, id: &str, defaults: ScreenSettings) -> Result<Arc<ScreenSession>> {
        let mut screens = self.screens.write().await;
        if screens.contains_key(id) {
            return Err(Error::SessionInUse(id.to_string()));
        }

        let session = Arc::new(ScreenSession::new(id, defaults));
        screens.insert(id.to_string(), session.clone());
        info!(session_id = %id, "Created new screen session");
        Ok(session)
    }

    /// Look up a screen session
    pub async fn screen(&self, id: &str) -> Option<Arc<ScreenSession>> {
        self.screens.read().await.get(id).cloned()
    }

    /// Remove `owner` from the registry and stop its capture loop
    pub async fn close_screen(&self, id: &str, owner: &Arc<ScreenSession>) -> bool {
        let mut screens = self.screens.write().await;
        match screens.get(id) {
            Some(current) if Arc::ptr_eq(current, owner) => {}
            _ => return false,
        }
        screens.remove(id);
        owner.deactivate();
        info!(session_id = %id, "Cleaned up screen session");
        true
    }

    /// Number of live screen sessions
    pub async fn screen_count(&self) -> usize {
        self.screens.read().await.len()
    }
}

/// How long a broadcast waits on one peer before dropping it
pub const DEFAULT_BROADCAST_TIMEOUT: Duration = Duration::from_secs(2);

/// Every open transport, keyed by connection id
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<Uuid, SharedSink>>,
    send_timeout: Duration,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            send_timeout: DEFAULT_BROADCAST_TIMEOUT,
        }
    }
}

impl ConnectionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the per-peer broadcast deadline
    #[must_use]
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Register a transport and return its connection id
    pub async fn connect(&self, sink: SharedSink) -> Uuid {
        let id = Uuid::new_v4();
        let mut connections = self.connections.write().await;
        connections.insert(id, sink);
        info!(conn_id = %id, total = connections.len(), "WebSocket connected");
        id
    }

    /// Unregister a transport. Repeated calls only log.
    pub async fn disconnect(&self, id: Uuid) -> bool {
        let mut connections = self.connections.write().await;
        if connections.remove(&id).is_some() {
            info!(conn_id = %id, total = connections.len(), "WebSocket disconnected");
            true
        } else {
            warn!(conn_id = %id, "Attempted to disconnect unknown connection");
            false
        }
    }

    /// Number of open transports
    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send `message` to every transport; ones that fail are dropped.
    ///
    /// Peers are written to concurrently and each gets `send_timeout`; a peer
    /// that stops reading counts as a failed delivery. Returns how many
    /// deliveries succeeded.
    pub async fn broadcast<T: Serialize + ?Sized>(&self, message: &T) -> Result<usize> {
        let json = serde_json::to_string(message)?;
        let targets: Vec<(Uuid, SharedSink)> = self
            .connections
            .read()
            .await
            .iter()
            .map(|(id, sink)| (*id, sink.clone()))
            .collect();

        let mut sends = JoinSet::new();
        for (id, sink) in targets {
            let text = json.clone();
            let deadline = self.send_timeout;
            sends.spawn(async move {
                let outcome = match tokio::time::timeout(deadline, sink.send_text(text)).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout(deadline.as_secs())),
                };
                (id, outcome)
            });
        }

        let mut delivered = 0;
        let mut failed = Vec::new();
        while let Some(joined) = sends.join_next().await {
            match joined {
                Ok((_, Ok(()))) => delivered += 1,
                Ok((id, Err(e))) => {
                    debug!(conn_id = %id, error = %e, "Broadcast delivery failed");
                    failed.push(id);
                }
                Err(e) => warn!(error = %e, "Broadcast task failed"),
            }
        }

        if !failed.is_empty() {
            let mut connections = self.connections.write().await;
            for id in &failed {
                connections.remove(id);
            }
            warn!(dropped = failed.len(), "Dropped connections after failed broadcast");
        }
        Ok(delivered)
    }
}
