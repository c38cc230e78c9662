//! Health check endpoint
//!
//! `/health` reports liveness plus session and connection counts.

use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use serverguard_core::{ConnectionRegistry, SessionRegistry, ShutdownController, WorkerPool};
use std::sync::Arc;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub connections: usize,
    pub terminal_sessions: usize,
    pub screen_sessions: usize,
    pub pool_workers: usize,
}

async fn health(
    Extension(sessions): Extension<Arc<SessionRegistry>>,
    Extension(connections): Extension<Arc<ConnectionRegistry>>,
    Extension(pool): Extension<Arc<WorkerPool>>,
    Extension(shutdown): Extension<Arc<ShutdownController>>,
) -> Json<HealthResponse> {
    let status = if shutdown.is_shutting_down() {
        "shutting_down"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        connections: connections.count().await,
        terminal_sessions: sessions.terminal_count().await,
        screen_sessions: sessions.screen_count().await,
        pool_workers: pool.workers(),
    })
}

pub fn health_routes() -> Router {
    Router::new().route("/health", get(health))
}
