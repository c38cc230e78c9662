//! Terminal session state

use crate::error::{Error, Result};
use crate::terminal::process::ProcessHandle;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Terminal session shared between its receive loop and streaming task
pub type SharedTerminalSession = Arc<Mutex<TerminalSession>>;

/// State of one remote shell session
#[derive(Debug)]
pub struct TerminalSession {
    id: String,
    current_directory: PathBuf,
    environment: HashMap<String, String>,
    active_process: Option<ProcessHandle>,
    history: Vec<String>,
    connected: bool,
    created_at: DateTime<Utc>,
}

impl TerminalSession {
    /// Create a session rooted at the server's working directory
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let current_directory = std::env::current_dir()
            .ok()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("/"));

        Self {
            id: id.into(),
            current_directory,
            environment: std::env::vars().collect(),
            active_process: None,
            history: Vec::new(),
            connected: true,
            created_at: Utc::now(),
        }
    }

    /// Start in a specific directory
    #[must_use]
    pub fn with_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_directory = dir.into();
        self
    }

    /// Session id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Working directory new commands run in
    #[must_use]
    pub fn current_directory(&self) -> &Path {
        &self.current_directory
    }

    /// Accepted commands, oldest first
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Whether a client is attached
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// When the session was created
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Handle of the outstanding command, if any
    #[must_use]
    pub fn active_process(&self) -> Option<&ProcessHandle> {
        self.active_process.as_ref()
    }

    /// Whether a command is still outstanding
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.active_process
            .as_ref()
            .is_some_and(ProcessHandle::is_running)
    }

    pub(crate) fn set_active_process(&mut self, handle: ProcessHandle) {
        self.active_process = Some(handle);
    }

    pub(crate) fn take_active_process(&mut self) -> Option<ProcessHandle> {
        self.active_process.take()
    }

    /// Clear the active process if it is still the one with `process_id`
    pub(crate) fn clear_active_process(&mut self, process_id: u64) {
        if self
            .active_process
            .as_ref()
            .is_some_and(|p| p.id() == process_id)
        {
            self.active_process = None;
        }
    }

    pub(crate) fn record_command(&mut self, command: &str) {
        self.history.push(command.to_string());
    }

    /// Environment for the next spawned command
    #[must_use]
    pub fn spawn_environment(&self) -> HashMap<String, String> {
        let mut env = self.environment.clone();
        env.insert(
            "PWD".to_string(),
            self.current_directory.to_string_lossy().into_owned(),
        );
        env
    }

    /// Resolve `target` against the session and move into it.
    ///
    /// `~` and `~/...` expand to the home directory, relative paths join the
    /// current directory. The stored path is absolute with `.` and `..`
    /// folded away lexically. On failure the directory is unchanged.
    pub fn change_directory(&mut self, target: &str) -> Result<&Path> {
        let requested = self.resolve(target)?;
        if !requested.is_dir() {
            return Err(Error::NotFound(requested.display().to_string()));
        }
        self.current_directory = normalize(&requested);
        Ok(&self.current_directory)
    }

    fn resolve(&self, target: &str) -> Result<PathBuf> {
        let home = || dirs::home_dir().ok_or_else(|| Error::NotFound(target.to_string()));

        if target == "~" {
            return home();
        }
        if let Some(rest) = target.strip_prefix("~/") {
            return Ok(home()?.join(rest));
        }

        let path = Path::new(target);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.current_directory.join(path))
        }
    }
}

/// Extract the target of a `cd <dir>` command
#[must_use]
pub fn parse_cd(command: &str) -> Option<&str> {
    let trimmed = command.trim();
    let target = trimmed.strip_prefix("cd ")?.trim();
    (!target.is_empty()).then_some(target)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cd() {
        assert_eq!(parse_cd("cd /tmp"), Some("/tmp"));
        assert_eq!(parse_cd("  cd   projects  "), Some("projects"));
        assert_eq!(parse_cd("cd"), None);
        assert_eq!(parse_cd("cd   "), None);
        assert_eq!(parse_cd("cdrom"), None);
        assert_eq!(parse_cd("echo cd /tmp"), None);
    }

    #[test]
    fn test_change_to_relative_directory() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("child")).unwrap();

        let mut session = TerminalSession::new("t1").with_directory(root.path());
        let dir = session.change_directory("child").unwrap().to_path_buf();

        assert_eq!(dir, root.path().join("child"));
        assert_eq!(session.current_directory(), root.path().join("child"));
    }

    #[test]
    fn test_parent_components_are_folded() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("a/b")).unwrap();

        let mut session = TerminalSession::new("t1").with_directory(root.path().join("a/b"));
        session.change_directory("../.").unwrap();

        assert_eq!(session.current_directory(), root.path().join("a"));
    }

    #[test]
    fn test_missing_directory_leaves_state_unchanged() {
        let root = tempfile::tempdir().unwrap();
        let mut session = TerminalSession::new("t1").with_directory(root.path());

        let err = session.change_directory("does-not-exist").unwrap_err();
        assert_eq!(err.code(), "not_found");
        assert!(err.to_string().contains("does-not-exist"));
        assert_eq!(session.current_directory(), root.path());
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("notes.txt"), "x").unwrap();
        let mut session = TerminalSession::new("t1").with_directory(root.path());

        assert!(session.change_directory("notes.txt").is_err());
    }

    #[test]
    fn test_home_expansion() {
        if let Some(home) = dirs::home_dir() {
            if home.is_dir() {
                let mut session = TerminalSession::new("t1");
                session.change_directory("~").unwrap();
                assert_eq!(session.current_directory(), normalize(&home));
            }
        }
    }

    #[test]
    fn test_spawn_environment_sets_pwd() {
        let root = tempfile::tempdir().unwrap();
        let session = TerminalSession::new("t1").with_directory(root.path());
        let env = session.spawn_environment();
        assert_eq!(
            env.get("PWD").map(String::as_str),
            Some(root.path().to_string_lossy().as_ref())
        );
    }

    #[test]
    fn test_new_session_is_connected_and_idle() {
        let session = TerminalSession::new("abc");
        assert_eq!(session.id(), "abc");
        assert!(session.is_connected());
        assert!(!session.is_busy());
        assert!(session.history().is_empty());
        assert!(session.current_directory().is_absolute());
    }
}
