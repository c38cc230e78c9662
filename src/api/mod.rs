//! Web API module for ServerGuard
//!
//! Provides REST API endpoints for:
//! - Login
//! - One-shot command execution
//! - Screen info and live stream settings
//! - Health

pub mod auth;
pub mod command;
pub mod error;
pub mod health;
pub mod screen;

use axum::Router;

pub use auth::auth_routes;
pub use command::{command_routes, CommandRunner};
pub use error::ApiError;
pub use health::health_routes;
pub use screen::screen_routes;

/// Create the API router with all endpoints
pub fn api_router() -> Router {
    Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .merge(command_routes())
        .merge(screen_routes())
}
