//! Authentication gate
//!
//! The backend has a single administrator. A successful login hands out the
//! configured static access token; every protected call presents it again.
//! All secret comparisons are constant-time.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No credentials provided
    #[error("Authentication required")]
    MissingCredentials,

    /// Invalid token or login
    #[error("Invalid credentials")]
    InvalidCredentials,
}

impl AuthError {
    /// Get error code for API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
        }
    }
}

/// Auth result type
pub type Result<T> = std::result::Result<T, AuthError>;

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Access token accepted on protected endpoints
    #[serde(default = "default_token")]
    pub token: String,
    /// Administrator login name
    #[serde(default = "default_username")]
    pub username: String,
    /// Administrator password
    #[serde(default = "default_password")]
    pub password: String,
    /// Require the token on websocket upgrades too
    #[serde(default)]
    pub websocket_required: bool,
}

fn default_token() -> String {
    "valid-token".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "admin123".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: default_token(),
            username: default_username(),
            password: default_password(),
            websocket_required: false,
        }
    }
}

impl AuthConfig {
    /// Whether any credential still has its shipped default value
    #[must_use]
    pub fn uses_default_credentials(&self) -> bool {
        self.token == default_token()
            || (self.username == default_username() && self.password == default_password())
    }
}

/// Checks tokens and logins against the configured credentials
#[derive(Debug, Clone)]
pub struct AuthGate {
    config: AuthConfig,
}

impl AuthGate {
    /// Create a gate
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Whether `token` is the configured access token
    #[must_use]
    pub fn is_valid_token(&self, token: &str) -> bool {
        constant_time_eq(token, &self.config.token)
    }

    /// Check a presented token, distinguishing absent from wrong
    pub fn verify(&self, token: Option<&str>) -> Result<()> {
        match token {
            None => Err(AuthError::MissingCredentials),
            Some(t) if self.is_valid_token(t) => {
                debug!("Token accepted");
                Ok(())
            }
            Some(_) => {
                warn!("Invalid token presented");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Exchange administrator credentials for the access token
    pub fn login(&self, username: &str, password: &str) -> Result<&str> {
        // Evaluate both so timing does not reveal which one failed
        let user_ok = constant_time_eq(username, &self.config.username);
        let pass_ok = constant_time_eq(password, &self.config.password);
        if user_ok & pass_ok {
            info!(username = %username, "Login succeeded");
            Ok(&self.config.token)
        } else {
            warn!(username = %username, "Login failed");
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Whether websocket upgrades must carry the token
    #[must_use]
    pub fn websocket_required(&self) -> bool {
        self.config.websocket_required
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AuthGate {
        AuthGate::new(AuthConfig {
            token: "s3cret-token".into(),
            username: "root".into(),
            password: "hunter2".into(),
            websocket_required: true,
        })
    }

    #[test]
    fn test_token_validation() {
        let gate = gate();
        assert!(gate.is_valid_token("s3cret-token"));
        assert!(!gate.is_valid_token("s3cret-toke"));
        assert!(!gate.is_valid_token(""));
    }

    #[test]
    fn test_verify_distinguishes_missing_and_invalid() {
        let gate = gate();
        assert!(gate.verify(Some("s3cret-token")).is_ok());
        assert!(matches!(gate.verify(None), Err(AuthError::MissingCredentials)));
        assert!(matches!(
            gate.verify(Some("nope")),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_login() {
        let gate = gate();
        assert_eq!(gate.login("root", "hunter2").unwrap(), "s3cret-token");
        assert!(gate.login("root", "wrong").is_err());
        assert!(gate.login("admin", "hunter2").is_err());
    }

    #[test]
    fn test_default_credentials_detected() {
        assert!(AuthConfig::default().uses_default_credentials());
        assert!(!gate().config.uses_default_credentials());
        assert!(!AuthConfig::default().websocket_required);
    }
}
