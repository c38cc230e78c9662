//! Authentication middleware for Axum
//!
//! Extracts Bearer tokens or API keys from requests and validates them
//! against the [`AuthGate`]. Provides `RequireAuth` for REST handlers and
//! `WsAuth` for websocket upgrades.

use axum::{
    extract::{FromRequestParts, Query},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serverguard_core::auth::{AuthError, AuthGate};
use std::sync::Arc;

/// JSON error response for auth failures
#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl AuthErrorResponse {
    fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Auth rejection type
pub struct AuthRejection {
    status: StatusCode,
    body: AuthErrorResponse,
}

impl AuthRejection {
    fn not_configured() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: AuthErrorResponse::new("Authentication is not configured", "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<AuthError> for AuthRejection {
    fn from(err: AuthError) -> Self {
        let message = match err {
            AuthError::MissingCredentials => {
                "Authentication required. Provide Authorization: Bearer <token> or X-API-Key header."
            }
            AuthError::InvalidCredentials => "Invalid credentials",
        };
        AuthRejection {
            status: StatusCode::UNAUTHORIZED,
            body: AuthErrorResponse::new(message, err.code()),
        }
    }
}

// ============================================================================
// RequireAuth Extractor
// ============================================================================

/// Axum extractor that requires a valid access token.
///
/// Extracts the token from:
/// 1. `Authorization: Bearer <token>` header
/// 2. `X-API-Key: <key>` header
/// 3. `?token=<token>` query parameter (for WebSocket connections)
pub struct RequireAuth;

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let gate = auth_gate(parts)?;
        gate.verify(extract_token(parts).as_deref())?;
        Ok(RequireAuth)
    }
}

/// Websocket upgrade guard; only checks the token when
/// `auth.websocket_required` is set
pub struct WsAuth;

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for WsAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let gate = auth_gate(parts)?;
        if gate.websocket_required() {
            gate.verify(extract_token(parts).as_deref())?;
        }
        Ok(WsAuth)
    }
}

fn auth_gate(parts: &Parts) -> std::result::Result<Arc<AuthGate>, AuthRejection> {
    parts
        .extensions
        .get::<Arc<AuthGate>>()
        .cloned()
        .ok_or_else(AuthRejection::not_configured)
}

/// Extract token from request headers or query params
fn extract_token(parts: &Parts) -> Option<String> {
    // 1. Authorization: Bearer <token>
    if let Some(value) = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }

    // 2. X-API-Key header
    if let Some(value) = parts.headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        return Some(value.trim().to_string());
    }

    // 3. ?token= query parameter, percent-decoded
    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(query)| query.token)
        .filter(|t| !t.is_empty())
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}
