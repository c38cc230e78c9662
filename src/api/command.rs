//! One-shot command execution over HTTP
//!
//! Coarser than the terminal filter: a substring blocklist, then the command
//! runs through the shell with a timeout and its captured output is returned.

use axum::{extract::Extension, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serverguard_core::filter;
use serverguard_core::terminal::run_to_completion;
use serverguard_core::{Error, ShellSpec};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::error::ApiError;
use crate::middleware::auth::RequireAuth;
use crate::server::config::AppConfig;

/// Shell and limits for HTTP commands
#[derive(Debug, Clone)]
pub struct CommandRunner {
    shell: ShellSpec,
    timeout: Duration,
    working_directory: Option<PathBuf>,
}

impl CommandRunner {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            shell: config.terminal.shell_spec(),
            timeout: config.command.timeout(),
            working_directory: config.terminal.start_directory.clone(),
        }
    }

    #[must_use]
    pub fn with_shell(mut self, shell: ShellSpec) -> Self {
        self.shell = shell;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub output: String,
    pub error: String,
    pub exit_code: i32,
}

async fn execute_command(
    _auth: RequireAuth,
    Extension(runner): Extension<Arc<CommandRunner>>,
    Json(request): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = request.command.trim();
    if command.is_empty() {
        return Err(ApiError::bad_request("Command must not be empty"));
    }

    info!(command = %command, "HTTP command execution");

    if filter::is_blocked_for_http(command) {
        warn!(command = %command, "Dangerous HTTP command rejected");
        return Err(ApiError::forbidden("Potentially dangerous command rejected"));
    }

    let result = run_to_completion(
        &runner.shell,
        command,
        runner.working_directory.as_deref(),
        runner.timeout,
    )
    .await;

    match result {
        Ok(output) => {
            info!(exit_code = output.exit_code, "HTTP command completed");
            Ok(Json(CommandResponse {
                output: output.stdout,
                error: output.stderr,
                exit_code: output.exit_code,
            }))
        }
        Err(Error::Timeout(secs)) => {
            warn!(command = %command, timeout_secs = secs, "HTTP command timed out");
            Err(ApiError::timeout("Command execution timed out"))
        }
        Err(e) => {
            warn!(command = %command, error = %e, "HTTP command execution failed");
            Err(ApiError::internal(e.to_string()))
        }
    }
}

pub fn command_routes() -> Router {
    Router::new().route("/api/system/command", post(execute_command))
}
