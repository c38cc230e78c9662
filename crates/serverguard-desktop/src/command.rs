//! Helper program invocation

use crate::error::{Error, Result};
use std::process::Command;
use tracing::debug;

/// Runs one external helper, optionally against a specific X display
#[derive(Debug, Clone)]
pub struct HelperCommand {
    program: String,
    display: Option<String>,
}

impl HelperCommand {
    /// Create a runner for `program`
    #[must_use]
    pub fn new(program: impl Into<String>, display: Option<String>) -> Self {
        Self {
            program: program.into(),
            display,
        }
    }

    /// Program name
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run to completion and return stdout. Blocking.
    pub fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<Vec<u8>> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args.iter().map(AsRef::as_ref));
        if let Some(display) = &self.display {
            cmd.env("DISPLAY", display);
        }

        let output = cmd.output().map_err(|source| Error::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(Error::CommandFailed {
                program: self.program.clone(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!(program = %self.program, bytes = output.stdout.len(), "Helper finished");
        Ok(output.stdout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_run_returns_stdout() {
        let helper = HelperCommand::new("sh", None);
        let out = helper.run(&["-c", "printf abc"]).unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn test_display_is_exported() {
        let helper = HelperCommand::new("sh", Some(":7".into()));
        let out = helper.run(&["-c", "printf \"$DISPLAY\""]).unwrap();
        assert_eq!(out, b":7");
    }

    #[test]
    fn test_failure_carries_stderr() {
        let helper = HelperCommand::new("sh", None);
        let err = helper.run(&["-c", "echo nope >&2; exit 4"]).unwrap_err();
        match err {
            Error::CommandFailed { status, stderr, .. } => {
                assert_eq!(status, 4);
                assert_eq!(stderr, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_program() {
        let helper = HelperCommand::new("/no/such/helper", None);
        let err = helper.run::<&str>(&[]).unwrap_err();
        assert_eq!(err.code(), "spawn_failed");
    }
}
