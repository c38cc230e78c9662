//! Screen WebSocket handlers
//!
//! - `/ws/screen/:session_id`: frame stream
//! - `/ws/screen-control/:session_id`: pointer and keyboard events

use axum::{
    extract::{ws::WebSocketUpgrade, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serverguard_core::{ScreenEngine, ShutdownController};
use std::sync::Arc;

use super::transport;
use crate::middleware::auth::WsAuth;

/// Frame stream upgrade handler
pub async fn screen_handler(
    _auth: WsAuth,
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    Extension(engine): Extension<Arc<ScreenEngine>>,
    Extension(shutdown): Extension<Arc<ShutdownController>>,
) -> Response {
    if shutdown.is_shutting_down() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    ws.on_upgrade(move |socket| async move {
        let _guard = shutdown.register_session();
        let (sink, stream) = transport::split(socket);
        engine.run_stream(&session_id, sink, stream).await;
    })
}

/// Control channel upgrade handler
pub async fn screen_control_handler(
    _auth: WsAuth,
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    Extension(engine): Extension<Arc<ScreenEngine>>,
    Extension(shutdown): Extension<Arc<ShutdownController>>,
) -> Response {
    if shutdown.is_shutting_down() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    ws.on_upgrade(move |socket| async move {
        let _guard = shutdown.register_session();
        let (sink, stream) = transport::split(socket);
        engine.run_control(&session_id, sink, stream).await;
    })
}
