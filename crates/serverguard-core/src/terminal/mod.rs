//! Remote shell sessions
//!
//! A terminal session runs one command at a time through the host shell and
//! streams its output back over the session's connection. The working
//! directory is tracked by the session itself: `cd` never reaches the shell.

pub mod engine;
pub mod process;
pub mod protocol;
pub mod session;


pub use engine::TerminalEngine;
pub use process::{run_to_completion, CommandOutput, ProcessHandle, ShellSpec};
pub use protocol::{ClientMessage, ServerMessage};
pub use session::{parse_cd, SharedTerminalSession, TerminalSession};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Terminal engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Seconds without client traffic before a heartbeat is sent
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Shell executable; `bash` (or `cmd` on Windows) when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    /// Directory new sessions start in; the server's own when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_directory: Option<PathBuf>,
}

fn default_idle_timeout_secs() -> u64 {
    300
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            shell: None,
            start_directory: None,
        }
    }
}

impl TerminalConfig {
    /// Idle receive timeout
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Shell to run commands with
    #[must_use]
    pub fn shell_spec(&self) -> ShellSpec {
        self.shell
            .as_deref()
            .map_or_else(ShellSpec::platform_default, ShellSpec::new)
    }
}
