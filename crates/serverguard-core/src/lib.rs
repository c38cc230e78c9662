//! ServerGuard Core - Remote Session Engine
//!
//! This crate provides the interactive remote-session subsystem of the
//! ServerGuard administration backend:
//! - Terminal: remote shell sessions with live output streaming
//! - Screen: frame capture loop and input-injection control channel
//! - Registry: session and connection bookkeeping
//! - Pool: bounded worker pool for blocking desktop calls
//! - Filter: dangerous-command blocklists
//! - Auth: static token and login checks
//! - Shutdown: graceful shutdown signalling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod desktop;
pub mod error;
pub mod filter;
pub mod pool;
pub mod registry;
pub mod screen;
pub mod shutdown;
pub mod terminal;
pub mod transport;

pub use auth::{AuthError, AuthGate};
pub use desktop::{FrameCapturer, InputInjector, MouseButton};
pub use error::{Error, Result};
pub use pool::{PoolConfig, WorkerPool};
pub use registry::{ConnectionRegistry, SessionRegistry};
pub use screen::{ScreenConfig, ScreenEngine, ScreenSession, ScreenSettings, SettingsUpdate};
pub use shutdown::{wait_for_shutdown_signal, ShutdownController};
pub use terminal::{ShellSpec, TerminalConfig, TerminalEngine, TerminalSession};
pub use transport::{MessageSink, MessageStream, SharedSink};

/// Current time as an RFC 3339 timestamp for protocol messages
#[must_use]
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
