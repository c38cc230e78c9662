//! JSON error responses for REST handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serverguard_core::Error;

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    code: String,
}

/// Error returned by API handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message, "FORBIDDEN")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message, "NOT_FOUND")
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::REQUEST_TIMEOUT, message, "TIMEOUT")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "INTERNAL_ERROR")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match &err {
            Error::NotFound(_) => Self::not_found(err.to_string()),
            Error::PolicyRejection(_) => Self::forbidden(err.to_string()),
            Error::Timeout(_) => Self::timeout(err.to_string()),
            Error::Protocol(_) => Self::bad_request(err.to_string()),
            Error::Unsupported(_) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string(), "UNSUPPORTED")
            }
            _ => Self::internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.message,
            code: self.code.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        assert_eq!(
            ApiError::from(Error::NotFound("screen session x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(Error::Timeout(30)).status(),
            StatusCode::REQUEST_TIMEOUT
        );
        assert_eq!(
            ApiError::from(Error::Unsupported("disabled".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(Error::desktop("no display")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
