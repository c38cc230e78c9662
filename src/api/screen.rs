//! Screen control plane
//!
//! - `GET /api/screen/info`: captured display size
//! - `POST /api/screen/settings/:session_id`: adjust a live stream

use axum::{
    extract::{Extension, Path},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serverguard_core::{ScreenEngine, ScreenSettings, SettingsUpdate};
use std::sync::Arc;

use super::error::ApiError;
use crate::middleware::auth::RequireAuth;

#[derive(Debug, Serialize)]
pub struct ScreenInfoResponse {
    pub width: u32,
    pub height: u32,
}

async fn screen_info(
    _auth: RequireAuth,
    Extension(engine): Extension<Arc<ScreenEngine>>,
) -> Result<Json<ScreenInfoResponse>, ApiError> {
    let (width, height) = engine.screen_size().await?;
    Ok(Json(ScreenInfoResponse { width, height }))
}

async fn update_settings(
    _auth: RequireAuth,
    Extension(engine): Extension<Arc<ScreenEngine>>,
    Path(session_id): Path<String>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<ScreenSettings>, ApiError> {
    let settings = engine.update_settings(&session_id, &update).await?;
    Ok(Json(settings))
}

pub fn screen_routes() -> Router {
    Router::new()
        .route("/api/screen/info", get(screen_info))
        .route("/api/screen/settings/:session_id", post(update_settings))
}
