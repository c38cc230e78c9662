//! Server configuration types
//!
//! Contains all configuration structures for the ServerGuard server.

use serde::{Deserialize, Serialize};
use serverguard_core::auth::AuthConfig;
use serverguard_core::{PoolConfig, ScreenConfig, TerminalConfig};
use serverguard_desktop::DesktopConfig;
use std::path::PathBuf;
use std::time::Duration;

const REDACTED: &str = "********";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub terminal: TerminalConfig,
    #[serde(default)]
    pub screen: ScreenSection,
    #[serde(default)]
    pub command: CommandConfig,
}

impl AppConfig {
    /// Copy with credentials masked, for printing
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.auth.token = REDACTED.to_string();
        config.auth.password = REDACTED.to_string();
        config
    }

    /// `host:port` the HTTP server binds to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins; `"*"` allows any
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Console log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Directory for daily-rotated log files; console only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

fn default_filter() -> String {
    "serverguard=info,tower_http=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: default_filter(),
            directory: None,
        }
    }
}

/// `[screen]` holds both engine defaults and the desktop backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenSection {
    #[serde(flatten)]
    pub engine: ScreenConfig,
    #[serde(flatten)]
    pub desktop: DesktopConfig,
}

/// One-shot HTTP command settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    #[serde(default = "default_command_timeout")]
    pub timeout_secs: u64,
}

fn default_command_timeout() -> u64 {
    30
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_command_timeout(),
        }
    }
}

impl CommandConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
