//! Error types for serverguard-core
//!
//! Every failure a session can hit maps onto one variant here. Only
//! transport failures end a session; everything else is reported back to
//! the client as an `error` message and the loop carries on.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Command matched the dangerous-pattern blocklist
    #[error("command rejected by policy: {0}")]
    PolicyRejection(String),

    /// Directory or session could not be found
    #[error("not found: {0}")]
    NotFound(String),

    /// Child process could not be started
    #[error("spawn failed: {0}")]
    Spawn(String),

    /// Reading child output failed
    #[error("stream failed: {0}")]
    Stream(String),

    /// Client sent a message that could not be decoded
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Sending or receiving on the transport failed
    #[error("transport error: {0}")]
    Transport(String),

    /// Peer closed the connection
    #[error("connection closed")]
    ConnectionClosed,

    /// Command timed out
    #[error("timed out after {0} seconds")]
    Timeout(u64),

    /// Session already runs a command
    #[error("command already running: {0}")]
    Busy(String),

    /// Session id is held by another live connection
    #[error("session in use: {0}")]
    SessionInUse(String),

    /// Worker pool job failed or panicked
    #[error("worker pool error: {0}")]
    Pool(String),

    /// Desktop backend error (capture or input)
    #[error("desktop error: {0}")]
    Desktop(String),

    /// Operation not supported by the configured backend
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a transport error
    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a protocol error
    #[must_use]
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a desktop backend error
    #[must_use]
    pub fn desktop(msg: impl Into<String>) -> Self {
        Self::Desktop(msg.into())
    }

    /// Create a worker pool error
    #[must_use]
    pub fn pool(msg: impl Into<String>) -> Self {
        Self::Pool(msg.into())
    }

    /// Whether this error ends the session it happened in
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::ConnectionClosed)
    }

    /// Get error code for protocol messages
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::PolicyRejection(_) => "policy_rejection",
            Self::NotFound(_) => "not_found",
            Self::Spawn(_) => "spawn_failure",
            Self::Stream(_) => "stream_failure",
            Self::Protocol(_) => "protocol_error",
            Self::Transport(_) => "transport_failure",
            Self::ConnectionClosed => "connection_closed",
            Self::Timeout(_) => "timeout",
            Self::Busy(_) => "busy",
            Self::SessionInUse(_) => "session_in_use",
            Self::Pool(_) => "pool_error",
            Self::Desktop(_) => "desktop_error",
            Self::Unsupported(_) => "unsupported",
            Self::Serialization(_) => "serialization_error",
            Self::Io(_) => "io_error",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::Busy("ls".into()).code(), "busy");
        assert_eq!(
            Error::SessionInUse("abc".into()).code(),
            "session_in_use"
        );
        assert_eq!(Error::transport("reset").code(), "transport_failure");
    }

    #[test]
    fn test_only_transport_errors_are_fatal() {
        assert!(Error::transport("broken pipe").is_fatal());
        assert!(Error::ConnectionClosed.is_fatal());
        assert!(!Error::Spawn("no such file".into()).is_fatal());
        assert!(!Error::protocol("bad json").is_fatal());
        assert!(!Error::Timeout(30).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("/nope".into());
        assert_eq!(err.to_string(), "not found: /nope");

        let err = Error::Timeout(30);
        assert_eq!(err.to_string(), "timed out after 30 seconds");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert_eq!(err.code(), "io_error");
    }
}
