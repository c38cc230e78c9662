//! Shell process lifecycle
//!
//! Commands run through the platform shell with piped output. A running
//! command is owned by its streaming task; the session only keeps a
//! [`ProcessHandle`] that can ask that task to kill the child.

use crate::error::{Error, Result};
use crate::terminal::protocol::ServerMessage;
use crate::terminal::session::SharedTerminalSession;
use crate::transport::{send_json, MessageSink, SharedSink};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

static NEXT_PROCESS_ID: AtomicU64 = AtomicU64::new(1);

/// Shell used to interpret command lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSpec {
    /// Shell executable
    pub program: String,
    /// Flag that makes the shell run the next argument as a command line
    pub flag: String,
}

impl ShellSpec {
    /// `cmd /c` on Windows, `bash -c` elsewhere
    #[must_use]
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::new("cmd")
        } else {
            Self::new("bash")
        }
    }

    /// Build a spec for `program`, choosing `/c` for cmd and `-c` otherwise
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        let base = program
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&program)
            .to_ascii_lowercase();
        let flag = if base == "cmd" || base == "cmd.exe" {
            "/c"
        } else {
            "-c"
        };
        Self {
            flag: flag.to_string(),
            program,
        }
    }

    /// Command that runs `line` through this shell
    #[must_use]
    pub fn command(&self, line: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.flag).arg(line);
        cmd
    }
}

impl Default for ShellSpec {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Session-side handle to a running command
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    id: u64,
    pid: Option<u32>,
    command: String,
    started_at: DateTime<Utc>,
    cancel: CancellationToken,
    finished: Arc<AtomicBool>,
}

impl ProcessHandle {
    fn new(pid: Option<u32>, command: &str) -> Self {
        Self {
            id: NEXT_PROCESS_ID.fetch_add(1, Ordering::Relaxed),
            pid,
            command: command.to_string(),
            started_at: Utc::now(),
            cancel: CancellationToken::new(),
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Unique id of this command run
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// OS process id, when the platform reported one
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Command line being run
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// When the command was spawned
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether the child has not yet been reaped
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.finished.load(Ordering::Acquire)
    }

    /// Ask the owning task to kill the child. No-op once it has exited.
    pub fn terminate(&self) {
        if self.is_running() {
            self.cancel.cancel();
        }
    }

    fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }
}

/// Spawn `command` through `shell` in `cwd` with exactly `env`
pub fn spawn_shell(
    shell: &ShellSpec,
    command: &str,
    cwd: &Path,
    env: &HashMap<String, String>,
) -> Result<(ProcessHandle, Child)> {
    let mut cmd = shell.command(command);
    cmd.current_dir(cwd)
        .env_clear()
        .envs(env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| Error::Spawn(e.to_string()))?;
    let handle = ProcessHandle::new(child.id(), command);
    debug!(pid = ?handle.pid(), process_id = handle.id(), "Spawned shell command");
    Ok((handle, child))
}

/// Background task: forward a command's output and exit code to the client.
///
/// Stdout and stderr are read concurrently to EOF, then sent as one `output`
/// and one `error` message, followed by `exit`. If the handle is terminated
/// the child is killed and reaped without further messages. A send failure
/// cancels `closed`, which ends the owning session.
pub(crate) async fn stream_output(
    session_id: String,
    mut child: Child,
    handle: ProcessHandle,
    session: SharedTerminalSession,
    sink: SharedSink,
    closed: CancellationToken,
) {
    let result = drive(&mut child, &handle.cancel, sink.as_ref()).await;

    handle.mark_finished();
    session.lock().await.clear_active_process(handle.id());

    match result {
        Ok(Some(code)) => {
            info!(session_id = %session_id, exit_code = code, "Command completed");
        }
        Ok(None) => {
            info!(session_id = %session_id, pid = ?handle.pid(), "Terminated running command");
        }
        Err(e) if e.is_fatal() => {
            warn!(session_id = %session_id, error = %e, "Lost connection while streaming output");
            closed.cancel();
        }
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Error streaming command output");
            let reply = ServerMessage::error(format!("Error streaming command output: {e}"));
            if let Err(send_err) = send_json(sink.as_ref(), &reply).await {
                warn!(session_id = %session_id, error = %send_err, "Failed to report streaming error");
                closed.cancel();
            }
        }
    }
}

/// Returns `Ok(None)` when the command was terminated.
async fn drive(
    child: &mut Child,
    cancel: &CancellationToken,
    sink: &dyn MessageSink,
) -> Result<Option<i32>> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let read = async { tokio::try_join!(read_pipe(stdout), read_pipe(stderr)) };
    let output = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = read => Some(result),
    };
    let (out, err) = match output {
        Some(result) => result.map_err(|e| Error::Stream(e.to_string()))?,
        None => {
            kill_and_reap(child).await;
            return Ok(None);
        }
    };

    if !out.is_empty() {
        let data = String::from_utf8_lossy(&out).into_owned();
        debug!(bytes = out.len(), "Sending stdout");
        send_json(sink, &ServerMessage::Output { data }).await?;
    }
    if !err.is_empty() {
        let data = String::from_utf8_lossy(&err).into_owned();
        debug!(bytes = err.len(), "Sending stderr");
        send_json(sink, &ServerMessage::stderr(data)).await?;
    }

    let status = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        status = child.wait() => Some(status),
    };
    let status = match status {
        Some(status) => status.map_err(|e| Error::Stream(e.to_string()))?,
        None => {
            kill_and_reap(child).await;
            return Ok(None);
        }
    };

    let code = exit_code(status);
    send_json(sink, &ServerMessage::Exit { code }).await?;
    Ok(Some(code))
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

async fn kill_and_reap(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "Kill failed, child already exited");
    }
    if let Err(e) = child.wait().await {
        warn!(error = %e, "Failed to reap killed child");
    }
}

/// Exit code, or the negated signal number when killed by a signal
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

/// Captured result of a one-shot command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
    /// Exit code
    pub exit_code: i32,
}

/// Run `command` to completion, killing it after `timeout`
pub async fn run_to_completion(
    shell: &ShellSpec,
    command: &str,
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<CommandOutput> {
    let mut cmd = shell.command(command);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| Error::Spawn(e.to_string()))?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| Error::Timeout(timeout.as_secs()))?
        .map_err(|e| Error::Stream(e.to_string()))?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: exit_code(output.status),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh() -> ShellSpec {
        ShellSpec::new("sh")
    }

    #[test]
    fn test_shell_flag_selection() {
        assert_eq!(ShellSpec::new("bash").flag, "-c");
        assert_eq!(ShellSpec::new("/bin/zsh").flag, "-c");
        assert_eq!(ShellSpec::new("cmd").flag, "/c");
        assert_eq!(ShellSpec::new("C:\\Windows\\System32\\CMD.EXE").flag, "/c");
    }

    #[tokio::test]
    async fn test_run_to_completion_captures_output() {
        let out = run_to_completion(&sh(), "echo out; echo err >&2; exit 3", None, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
        assert_eq!(out.exit_code, 3);
    }

    #[tokio::test]
    async fn test_run_to_completion_times_out() {
        let err = run_to_completion(&sh(), "sleep 5", None, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "timeout");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_typed() {
        let shell = ShellSpec::new("/definitely/not/a/shell");
        let dir = tempfile::tempdir().unwrap();
        let err = spawn_shell(&shell, "true", dir.path(), &HashMap::new()).unwrap_err();
        assert_eq!(err.code(), "spawn_failure");
    }

    #[tokio::test]
    async fn test_terminated_handle_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let env: HashMap<String, String> = std::env::vars().collect();
        let (handle, mut child) = spawn_shell(&sh(), "sleep 30", dir.path(), &env).unwrap();
        assert!(handle.is_running());

        let (sink, _stream, _client) = crate::transport::memory::channel();
        handle.terminate();
        let result = drive(&mut child, &handle.cancel, sink.as_ref()).await.unwrap();

        assert_eq!(result, None);
        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn test_exit_code_from_signal() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(exit_code(ExitStatus::from_raw(9)), -9);
        assert_eq!(exit_code(ExitStatus::from_raw(2 << 8)), 2);
    }
}
