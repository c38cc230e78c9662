//! Error types for serverguard-desktop

use thiserror::Error;

/// Desktop backend error type
#[derive(Debug, Error)]
pub enum Error {
    /// Helper program could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program name
        program: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Helper program exited unsuccessfully
    #[error("{program} exited with status {status}: {stderr}")]
    CommandFailed {
        /// Program name
        program: String,
        /// Exit status, -1 if killed
        status: i32,
        /// Trimmed standard error
        stderr: String,
    },

    /// Helper program printed something unexpected
    #[error("unexpected output from {program}: {output}")]
    Parse {
        /// Program name
        program: String,
        /// Offending output
        output: String,
    },

    /// Backend configuration is unusable
    #[error("invalid desktop configuration: {0}")]
    InvalidConfig(String),

    /// Backend does not support the operation
    #[error("{0}")]
    Unsupported(String),
}

impl Error {
    /// Get error code for protocol messages
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "spawn_failed",
            Self::CommandFailed { .. } => "command_failed",
            Self::Parse { .. } => "parse_error",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Unsupported(_) => "unsupported",
        }
    }
}

impl From<Error> for serverguard_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Unsupported(msg) => Self::Unsupported(msg),
            other => Self::desktop(other.to_string()),
        }
    }
}

/// Result type alias for desktop operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_into_core_error() {
        let err: serverguard_core::Error = Error::Unsupported("screen capture disabled".into()).into();
        assert_eq!(err.code(), "unsupported");

        let err: serverguard_core::Error = Error::CommandFailed {
            program: "xdotool".into(),
            status: 1,
            stderr: "Can't open display".into(),
        }
        .into();
        assert_eq!(err.code(), "desktop_error");
        assert!(err.to_string().contains("Can't open display"));
    }
}
