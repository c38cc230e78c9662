//! Login endpoint
//!
//! Exchanges the administrator username and password for the access token.

use axum::{extract::Extension, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serverguard_core::AuthGate;
use std::sync::Arc;

use crate::middleware::auth::AuthRejection;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

async fn login(
    Extension(gate): Extension<Arc<AuthGate>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthRejection> {
    let token = gate.login(&request.username, &request.password)?;
    Ok(Json(LoginResponse {
        access_token: token.to_string(),
        token_type: "bearer",
    }))
}

pub fn auth_routes() -> Router {
    Router::new().route("/api/auth/login", post(login))
}
