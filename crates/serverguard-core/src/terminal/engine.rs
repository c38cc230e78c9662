//! Terminal session engine
//!
//! One [`TerminalEngine::run`] call drives one connection from welcome to
//! teardown:
//!
//! ```text
//! attach ─► welcome ─► receive (idle timeout) ─► dispatch ─┐
//!                        │  ▲                              │
//!                        │  └──────────────────────────────┘
//!                        ├─ timeout ─► heartbeat
//!                        └─ disconnect / transport error / shutdown ─► teardown
//! ```
//!
//! Commands run in a background task so output streaming never blocks the
//! receive loop.

use super::process::{spawn_shell, stream_output, ShellSpec};
use super::protocol::{ClientMessage, ServerMessage};
use super::session::{parse_cd, SharedTerminalSession, TerminalSession};
use super::TerminalConfig;
use crate::error::{Error, Result};
use crate::filter;
use crate::registry::{ConnectionRegistry, SessionRegistry};
use crate::transport::{send_json, MessageStream, SharedSink};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Drives terminal sessions over any transport
pub struct TerminalEngine {
    sessions: Arc<SessionRegistry>,
    connections: Arc<ConnectionRegistry>,
    shell: ShellSpec,
    idle_timeout: Duration,
    start_directory: Option<PathBuf>,
    shutdown: CancellationToken,
}

impl TerminalEngine {
    /// Create an engine from configuration
    #[must_use]
    pub fn new(
        sessions: Arc<SessionRegistry>,
        connections: Arc<ConnectionRegistry>,
        config: &TerminalConfig,
    ) -> Self {
        Self {
            sessions,
            connections,
            shell: config.shell_spec(),
            idle_timeout: config.idle_timeout(),
            start_directory: config.start_directory.clone(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Override the idle receive timeout
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Override the shell
    #[must_use]
    pub fn with_shell(mut self, shell: ShellSpec) -> Self {
        self.shell = shell;
        self
    }

    /// Start new sessions in `dir`
    #[must_use]
    pub fn with_start_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.start_directory = Some(dir.into());
        self
    }

    /// End every session when `token` is cancelled
    #[must_use]
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Serve one connection for `session_id` until it ends.
    ///
    /// Teardown always runs: the session is marked disconnected, its running
    /// command is terminated, and both registry entries are removed.
    pub async fn run<S: MessageStream>(&self, session_id: &str, sink: SharedSink, mut stream: S) {
        info!(session_id = %session_id, "Terminal connection attempt");
        let conn_id = self.connections.connect(sink.clone()).await;

        let session = match self
            .sessions
            .attach_terminal(session_id, || self.new_session(session_id))
            .await
        {
            Ok(session) => session,
            Err(e) => {
                warn!(session_id = %session_id, conn_id = %conn_id, error = %e, "Refusing terminal connection");
                let reply = ServerMessage::error_with_code(
                    format!("Terminal session {session_id} is already in use"),
                    e.code(),
                );
                if let Err(send_err) = send_json(sink.as_ref(), &reply).await {
                    debug!(conn_id = %conn_id, error = %send_err, "Failed to send refusal");
                }
                sink.close().await;
                self.connections.disconnect(conn_id).await;
                return;
            }
        };

        let closed = self.shutdown.child_token();
        match self.serve(session_id, &session, &sink, &mut stream, &closed).await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => {
                info!(session_id = %session_id, error = %e, "Terminal connection lost");
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Terminal session error");
            }
        }

        closed.cancel();
        self.sessions.close_terminal(session_id, &session).await;
        self.connections.disconnect(conn_id).await;
        sink.close().await;
    }

    fn new_session(&self, session_id: &str) -> TerminalSession {
        let session = TerminalSession::new(session_id);
        match &self.start_directory {
            Some(dir) => session.with_directory(dir.clone()),
            None => session,
        }
    }

    async fn serve<S: MessageStream>(
        &self,
        session_id: &str,
        session: &SharedTerminalSession,
        sink: &SharedSink,
        stream: &mut S,
        closed: &CancellationToken,
    ) -> Result<()> {
        let cwd = session.lock().await.current_directory().display().to_string();
        send_json(sink.as_ref(), &ServerMessage::welcome(session_id, cwd)).await?;
        info!(session_id = %session_id, "Sent welcome message");

        loop {
            let received = tokio::select! {
                biased;
                _ = closed.cancelled() => {
                    debug!(session_id = %session_id, "Terminal session closed");
                    return Ok(());
                }
                received = tokio::time::timeout(self.idle_timeout, stream.next_text()) => received,
            };

            let text = match received {
                Err(_) => {
                    if let Err(e) = send_json(sink.as_ref(), &ServerMessage::heartbeat()).await {
                        error!(session_id = %session_id, error = %e, "Failed to send heartbeat");
                        return Err(e);
                    }
                    debug!(session_id = %session_id, "Sent heartbeat");
                    continue;
                }
                Ok(Ok(Some(text))) => text,
                Ok(Ok(None)) => {
                    info!(session_id = %session_id, "Terminal client disconnected");
                    return Ok(());
                }
                Ok(Err(e)) => return Err(e),
            };

            self.dispatch(session_id, session, sink, closed, &text).await?;
        }
    }

    /// Handle one client message. Only transport failures are returned.
    async fn dispatch(
        &self,
        session_id: &str,
        session: &SharedTerminalSession,
        sink: &SharedSink,
        closed: &CancellationToken,
        text: &str,
    ) -> Result<()> {
        let value: serde_json::Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(_) => {
                warn!(session_id = %session_id, "Invalid JSON received");
                return send_json(
                    sink.as_ref(),
                    &ServerMessage::error("Invalid JSON message received"),
                )
                .await;
            }
        };

        let message = match serde_json::from_value::<ClientMessage>(value) {
            Ok(message) => message,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Malformed terminal message");
                return send_json(sink.as_ref(), &ServerMessage::error(format!("Invalid message: {e}")))
                    .await;
            }
        };

        match message {
            ClientMessage::Command { command } => {
                self.handle_command(session_id, session, sink, closed, command)
                    .await
            }
            ClientMessage::GetDirectory => {
                let path = session.lock().await.current_directory().display().to_string();
                send_json(sink.as_ref(), &ServerMessage::Directory { path }).await
            }
            ClientMessage::Ping => send_json(sink.as_ref(), &ServerMessage::pong()).await,
            ClientMessage::Unknown => {
                debug!(session_id = %session_id, "Ignoring message with unknown type");
                Ok(())
            }
        }
    }

    async fn handle_command(
        &self,
        session_id: &str,
        session: &SharedTerminalSession,
        sink: &SharedSink,
        closed: &CancellationToken,
        command: String,
    ) -> Result<()> {
        info!(session_id = %session_id, command = %command, "Received command");

        if filter::is_dangerous(&command) {
            warn!(
                session_id = %session_id,
                command = %command,
                pattern = ?filter::matched_pattern(&command),
                "Dangerous command rejected"
            );
            return send_json(sink.as_ref(), &ServerMessage::rejected(&command)).await;
        }

        let mut state = session.lock().await;

        if let Some(target) = parse_cd(&command) {
            state.record_command(&command);
            let reply = match state.change_directory(target) {
                Ok(dir) => ServerMessage::system(format!("Changed directory to: {}", dir.display())),
                Err(Error::NotFound(dir)) => ServerMessage::error(format!("Directory not found: {dir}")),
                Err(e) => ServerMessage::error(format!("Error changing directory: {e}")),
            };
            drop(state);
            return send_json(sink.as_ref(), &reply).await;
        }

        if let Some(running) = state.active_process().filter(|p| p.is_running()) {
            let reply = ServerMessage::busy(running.command());
            drop(state);
            info!(session_id = %session_id, "Rejected command while another is running");
            return send_json(sink.as_ref(), &reply).await;
        }

        let env = state.spawn_environment();
        let cwd = state.current_directory().to_path_buf();
        match spawn_shell(&self.shell, &command, &cwd, &env) {
            Ok((handle, child)) => {
                info!(
                    session_id = %session_id,
                    pid = ?handle.pid(),
                    cwd = %cwd.display(),
                    "Executing command"
                );
                state.record_command(&command);
                state.set_active_process(handle.clone());
                drop(state);

                tokio::spawn(stream_output(
                    session_id.to_string(),
                    child,
                    handle,
                    session.clone(),
                    sink.clone(),
                    closed.clone(),
                ));
                Ok(())
            }
            Err(e) => {
                drop(state);
                error!(session_id = %session_id, error = %e, "Command execution failed");
                let reason = match e {
                    Error::Spawn(reason) => reason,
                    other => other.to_string(),
                };
                send_json(
                    sink.as_ref(),
                    &ServerMessage::error(format!("Command execution failed: {reason}")),
                )
                .await
            }
        }
    }
}

