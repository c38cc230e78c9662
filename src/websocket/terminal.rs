//! Terminal WebSocket handler
//!
//! `/ws/terminal/:session_id` runs a remote shell session.

use axum::{
    extract::{ws::WebSocketUpgrade, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serverguard_core::{ShutdownController, TerminalEngine};
use std::sync::Arc;
use tracing::info;

use super::transport;
use crate::middleware::auth::WsAuth;

/// WebSocket upgrade handler
pub async fn terminal_handler(
    _auth: WsAuth,
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    Extension(engine): Extension<Arc<TerminalEngine>>,
    Extension(shutdown): Extension<Arc<ShutdownController>>,
) -> Response {
    if shutdown.is_shutting_down() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    ws.on_upgrade(move |socket| async move {
        let _guard = shutdown.register_session();
        info!(session_id = %session_id, "Terminal websocket upgraded");
        let (sink, stream) = transport::split(socket);
        engine.run(&session_id, sink, stream).await;
    })
}
