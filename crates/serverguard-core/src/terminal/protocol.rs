//! Terminal wire protocol
//!
//! JSON messages tagged by `type`.

use serde::{Deserialize, Serialize};

/// Messages sent by the client
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Run a command line
    Command {
        /// Command line
        command: String,
    },
    /// Report the working directory
    GetDirectory,
    /// Liveness probe
    Ping,
    /// Any other `type`; ignored
    #[serde(other)]
    Unknown,
}

/// Messages sent by the server
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Informational notice
    System {
        /// Human-readable text
        message: String,
        /// Working directory, sent with the welcome
        #[serde(skip_serializing_if = "Option::is_none")]
        current_directory: Option<String>,
    },
    /// Captured standard output
    Output {
        /// Output text
        data: String,
    },
    /// Failure report, or captured standard error in `data`
    Error {
        /// Error text
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        /// Captured standard error
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<String>,
        /// Rejected command
        #[serde(skip_serializing_if = "Option::is_none")]
        command: Option<String>,
        /// Machine-readable error code
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
    /// Command exit status
    Exit {
        /// Exit code, negative signal number if killed
        code: i32,
    },
    /// Working directory report
    Directory {
        /// Absolute path
        path: String,
    },
    /// Reply to `ping`
    Pong {
        /// ISO-8601 timestamp
        timestamp: String,
    },
    /// Sent after an idle receive timeout
    Heartbeat {
        /// ISO-8601 timestamp
        timestamp: String,
    },
}

impl ServerMessage {
    /// Session welcome
    #[must_use]
    pub fn welcome(session_id: &str, current_directory: String) -> Self {
        Self::System {
            message: format!("Terminal session {session_id} established. Ready for commands."),
            current_directory: Some(current_directory),
        }
    }

    /// Plain system notice
    #[must_use]
    pub fn system(message: impl Into<String>) -> Self {
        Self::System {
            message: message.into(),
            current_directory: None,
        }
    }

    /// Error with a message
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: Some(message.into()),
            data: None,
            command: None,
            code: None,
        }
    }

    /// Error with a message and code
    #[must_use]
    pub fn error_with_code(message: impl Into<String>, code: &str) -> Self {
        Self::Error {
            message: Some(message.into()),
            data: None,
            command: None,
            code: Some(code.to_string()),
        }
    }

    /// Captured standard error
    #[must_use]
    pub fn stderr(data: String) -> Self {
        Self::Error {
            message: None,
            data: Some(data),
            command: None,
            code: None,
        }
    }

    /// Command refused by the dangerous-pattern filter
    #[must_use]
    pub fn rejected(command: &str) -> Self {
        Self::Error {
            message: Some("Potentially dangerous command rejected for safety".to_string()),
            data: None,
            command: Some(command.to_string()),
            code: None,
        }
    }

    /// Command refused because another one is still running
    #[must_use]
    pub fn busy(running: &str) -> Self {
        Self::error_with_code(format!("Command already running: {running}"), "busy")
    }

    /// Reply to `ping`
    #[must_use]
    pub fn pong() -> Self {
        Self::Pong {
            timestamp: crate::timestamp(),
        }
    }

    /// Idle heartbeat
    #[must_use]
    pub fn heartbeat() -> Self {
        Self::Heartbeat {
            timestamp: crate::timestamp(),
        }
    }
}
