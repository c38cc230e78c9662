//! Screen session engine
//!
//! Two kinds of connection share a session id:
//! - the stream channel owns the [`ScreenSession`] and runs its capture loop
//!   next to a receive loop for pings;
//! - the control channel turns `control` messages into input injection.
//!
//! Capture and injection are blocking and go through the worker pool. When a
//! stream disconnects the session is deactivated and removed; a capture job
//! already in the pool finishes but its frame is dropped.

use super::control;
use super::protocol::{
    ControlClientMessage, ControlCommand, ScreenServerMessage, StreamClientMessage,
};
use super::session::{ScreenSession, SettingsUpdate, ScreenSettings};
use super::ScreenConfig;
use crate::desktop::{FrameCapturer, InputInjector};
use crate::error::{Error, Result};
use crate::pool::WorkerPool;
use crate::registry::{ConnectionRegistry, SessionRegistry};
use crate::transport::{send_json, MessageStream, SharedSink};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Drives screen stream and control connections
pub struct ScreenEngine {
    sessions: Arc<SessionRegistry>,
    connections: Arc<ConnectionRegistry>,
    pool: Arc<WorkerPool>,
    capturer: Arc<dyn FrameCapturer>,
    injector: Arc<dyn InputInjector>,
    defaults: ScreenSettings,
    idle_timeout: Duration,
    error_backoff: Duration,
    shutdown: CancellationToken,
}

impl ScreenEngine {
    /// Create an engine from configuration
    #[must_use]
    pub fn new(
        sessions: Arc<SessionRegistry>,
        connections: Arc<ConnectionRegistry>,
        pool: Arc<WorkerPool>,
        capturer: Arc<dyn FrameCapturer>,
        injector: Arc<dyn InputInjector>,
        config: &ScreenConfig,
    ) -> Self {
        Self {
            sessions,
            connections,
            pool,
            capturer,
            injector,
            defaults: config.default_settings(),
            idle_timeout: config.idle_timeout(),
            error_backoff: config.error_backoff(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Override the idle receive timeout
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Override the pause after a failed capture
    #[must_use]
    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// End every connection when `token` is cancelled
    #[must_use]
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Display size, queried through the pool
    pub async fn screen_size(&self) -> Result<(u32, u32)> {
        let capturer = self.capturer.clone();
        self.pool.submit(move || capturer.screen_size()).await
    }

    /// Change a live session's capture settings.
    ///
    /// Values are clamped; the capture loop picks them up on its next tick.
    pub async fn update_settings(
        &self,
        session_id: &str,
        update: &SettingsUpdate,
    ) -> Result<ScreenSettings> {
        let session = self
            .sessions
            .screen(session_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("screen session {session_id}")))?;
        let settings = session.update_settings(update).await;
        info!(
            session_id = %session_id,
            quality = settings.quality,
            scale = settings.scale,
            fps = settings.fps,
            "Screen settings updated"
        );
        Ok(settings)
    }

    /// Serve a frame stream for `session_id` until it ends
    pub async fn run_stream<S: MessageStream>(&self, session_id: &str, sink: SharedSink, mut stream: S) {
        info!(session_id = %session_id, "Screen stream connection attempt");
        let conn_id = self.connections.connect(sink.clone()).await;

        let session = match self.sessions.attach_screen(session_id, self.defaults).await {
            Ok(session) => session,
            Err(e) => {
                warn!(session_id = %session_id, conn_id = %conn_id, error = %e, "Refusing screen connection");
                let reply = ScreenServerMessage::error_with_code(
                    format!("Screen session {session_id} is already in use"),
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

        match self.screen_size().await {
            Ok((width, height)) => {
                if let Err(e) =
                    send_json(sink.as_ref(), &ScreenServerMessage::ScreenInfo { width, height }).await
                {
                    debug!(session_id = %session_id, error = %e, "Failed to send screen info");
                    closed.cancel();
                }
            }
            Err(e) => debug!(session_id = %session_id, error = %e, "Screen size unavailable"),
        }

        let capture = tokio::spawn(capture_loop(
            session.clone(),
            sink.clone(),
            self.pool.clone(),
            self.capturer.clone(),
            self.error_backoff,
            closed.clone(),
        ));

        if let Err(e) = self
            .receive_loop(session_id, &sink, &mut stream, &closed, Channel::Stream)
            .await
        {
            info!(session_id = %session_id, error = %e, "Screen stream ended");
        }

        closed.cancel();
        self.sessions.close_screen(session_id, &session).await;
        capture.abort();
        self.connections.disconnect(conn_id).await;
        sink.close().await;
    }

    /// Serve a control channel for `session_id` until it ends
    pub async fn run_control<S: MessageStream>(&self, session_id: &str, sink: SharedSink, mut stream: S) {
        info!(session_id = %session_id, "Screen control connection attempt");
        let conn_id = self.connections.connect(sink.clone()).await;
        let closed = self.shutdown.child_token();

        if let Err(e) = self
            .receive_loop(session_id, &sink, &mut stream, &closed, Channel::Control)
            .await
        {
            info!(session_id = %session_id, error = %e, "Screen control ended");
        }

        self.connections.disconnect(conn_id).await;
        sink.close().await;
    }

    async fn receive_loop<S: MessageStream>(
        &self,
        session_id: &str,
        sink: &SharedSink,
        stream: &mut S,
        closed: &CancellationToken,
        channel: Channel,
    ) -> Result<()> {
        loop {
            let received = tokio::select! {
                biased;
                _ = closed.cancelled() => return Ok(()),
                received = tokio::time::timeout(self.idle_timeout, stream.next_text()) => received,
            };

            let text = match received {
                Err(_) => {
                    if let Err(e) = send_json(sink.as_ref(), &ScreenServerMessage::heartbeat()).await {
                        error!(session_id = %session_id, error = %e, "Failed to send heartbeat");
                        return Err(e);
                    }
                    debug!(session_id = %session_id, "Sent heartbeat");
                    continue;
                }
                Ok(Ok(Some(text))) => text,
                Ok(Ok(None)) => {
                    info!(session_id = %session_id, channel = ?channel, "Screen client disconnected");
                    return Ok(());
                }
                Ok(Err(e)) => return Err(e),
            };

            let value: serde_json::Value = match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(_) => {
                    warn!(session_id = %session_id, "Invalid JSON received");
                    send_json(
                        sink.as_ref(),
                        &ScreenServerMessage::error("Invalid JSON message received"),
                    )
                    .await?;
                    continue;
                }
            };

            match channel {
                Channel::Stream => self.handle_stream_message(session_id, sink, value).await?,
                Channel::Control => self.handle_control_message(session_id, sink, value).await?,
            }
        }
    }

    async fn handle_stream_message(
        &self,
        session_id: &str,
        sink: &SharedSink,
        value: serde_json::Value,
    ) -> Result<()> {
        match serde_json::from_value::<StreamClientMessage>(value) {
            Ok(StreamClientMessage::Ping) => {
                send_json(sink.as_ref(), &ScreenServerMessage::pong()).await
            }
            Ok(StreamClientMessage::Unknown) => {
                debug!(session_id = %session_id, "Ignoring message with unknown type");
                Ok(())
            }
            Err(e) => {
                send_json(
                    sink.as_ref(),
                    &ScreenServerMessage::error(format!("Invalid message: {e}")),
                )
                .await
            }
        }
    }

    async fn handle_control_message(
        &self,
        session_id: &str,
        sink: &SharedSink,
        value: serde_json::Value,
    ) -> Result<()> {
        let data = match serde_json::from_value::<ControlClientMessage>(value) {
            Ok(ControlClientMessage::Control { data }) => data,
            Ok(ControlClientMessage::Ping) => {
                return send_json(sink.as_ref(), &ScreenServerMessage::pong()).await;
            }
            Ok(ControlClientMessage::Unknown) => {
                debug!(session_id = %session_id, "Ignoring message with unknown type");
                return Ok(());
            }
            Err(e) => {
                return send_json(
                    sink.as_ref(),
                    &ScreenServerMessage::error(format!("Invalid message: {e}")),
                )
                .await;
            }
        };

        let reply = match serde_json::from_value::<ControlCommand>(data) {
            Ok(command) => match self.inject(command).await {
                Ok(()) => ScreenServerMessage::control_ok(),
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "Input injection failed");
                    ScreenServerMessage::control_failed(e.to_string())
                }
            },
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Invalid control event");
                ScreenServerMessage::control_failed(format!("invalid control event: {e}"))
            }
        };
        send_json(sink.as_ref(), &reply).await
    }

    async fn inject(&self, command: ControlCommand) -> Result<()> {
        debug!(kind = command.kind(), "Injecting control event");
        let injector = self.injector.clone();
        self.pool
            .submit(move || control::apply(injector.as_ref(), &command))
            .await
    }
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Stream,
    Control,
}

/// Capture frames while the session is active.
///
/// A frame that fails to send ends the connection through `closed`. A capture
/// failure is reported best-effort and retried after `backoff`. When the loop
/// stops for any reason `closed` is cancelled, so a session deactivated from
/// outside tears down its connection too.
async fn capture_loop(
    session: Arc<ScreenSession>,
    sink: SharedSink,
    pool: Arc<WorkerPool>,
    capturer: Arc<dyn FrameCapturer>,
    backoff: Duration,
    closed: CancellationToken,
) {
    let session_id = session.id().to_string();
    debug!(session_id = %session_id, "Capture loop started");

    while session.is_active() && !closed.is_cancelled() {
        let settings = session.settings().await;
        let job_capturer = capturer.clone();
        let captured = pool
            .submit(move || job_capturer.capture_frame(settings.quality, settings.scale))
            .await;

        if !session.is_active() {
            break;
        }

        let pause = match captured {
            Ok(jpeg) => {
                let frame = ScreenServerMessage::Frame {
                    data: BASE64.encode(&jpeg),
                    timestamp: crate::timestamp(),
                };
                if let Err(e) = send_json(sink.as_ref(), &frame).await {
                    info!(session_id = %session_id, error = %e, "Frame delivery failed");
                    closed.cancel();
                    break;
                }
                settings.interval()
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Screen capture failed");
                let report = ScreenServerMessage::error_with_code(
                    format!("Screen capture failed: {e}"),
                    e.code(),
                );
                if let Err(send_err) = send_json(sink.as_ref(), &report).await {
                    debug!(session_id = %session_id, error = %send_err, "Failed to report capture error");
                }
                backoff
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            _ = closed.cancelled() => break,
        }
    }

    closed.cancel();
    debug!(session_id = %session_id, "Capture loop stopped");
}
