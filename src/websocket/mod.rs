//! WebSocket module for ServerGuard
//!
//! Provides real-time session endpoints:
//! - /ws/terminal/:session_id - Remote shell
//! - /ws/screen/:session_id - Screen frame stream
//! - /ws/screen-control/:session_id - Screen input control

pub mod screen;
pub mod terminal;
pub mod transport;

pub use screen::{screen_control_handler, screen_handler};
pub use terminal::terminal_handler;

use axum::{routing::get, Router};

/// Create the WebSocket router
pub fn websocket_router() -> Router {
    Router::new()
        .route("/ws/terminal/:session_id", get(terminal_handler))
        .route("/ws/screen/:session_id", get(screen_handler))
        .route("/ws/screen-control/:session_id", get(screen_control_handler))
}
