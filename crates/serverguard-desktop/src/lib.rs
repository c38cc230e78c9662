//! Desktop backends for ServerGuard
//!
//! Implements the core [`FrameCapturer`] and [`InputInjector`] traits:
//!
//! - `x11`: external capture command plus `xdotool`
//! - `disabled`: refuses everything, for headless servers

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod disabled;
pub mod error;
pub mod keys;
pub mod x11;

pub use disabled::DisabledBackend;
pub use error::{Error, Result};
pub use x11::{ExternalCapturer, XdotoolInjector};

use serde::{Deserialize, Serialize};
use serverguard_core::desktop::{FrameCapturer, InputInjector};
use std::sync::Arc;
use tracing::info;

/// Which desktop backend to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Capture and input through X11 helpers
    #[default]
    X11,
    /// No desktop access
    Disabled,
}

/// Desktop backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesktopConfig {
    /// Backend selection
    #[serde(default)]
    pub backend: BackendKind,
    /// Capture command; `{quality}`, `{percent}` and `{scale}` are expanded
    #[serde(default = "default_capture_command")]
    pub capture_command: Vec<String>,
    /// xdotool binary
    #[serde(default = "default_xdotool")]
    pub xdotool: String,
    /// X display override, e.g. ":0"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

fn default_capture_command() -> Vec<String> {
    x11::DEFAULT_CAPTURE_COMMAND
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

fn default_xdotool() -> String {
    "xdotool".to_string()
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            capture_command: default_capture_command(),
            xdotool: default_xdotool(),
            display: None,
        }
    }
}

/// Capturer and injector pair handed to the screen engine
#[derive(Clone)]
pub struct DesktopBackends {
    /// Frame source
    pub capturer: Arc<dyn FrameCapturer>,
    /// Input sink
    pub injector: Arc<dyn InputInjector>,
}

impl std::fmt::Debug for DesktopBackends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesktopBackends").finish_non_exhaustive()
    }
}

/// Build the configured backends
pub fn build_backends(config: &DesktopConfig) -> Result<DesktopBackends> {
    match config.backend {
        BackendKind::X11 => {
            let capturer =
                ExternalCapturer::new(&config.capture_command, &config.xdotool, config.display.clone())?;
            let injector = XdotoolInjector::new(&config.xdotool, config.display.clone());
            info!(
                capture = %config.capture_command.join(" "),
                xdotool = %config.xdotool,
                display = ?config.display,
                "X11 desktop backend ready"
            );
            Ok(DesktopBackends {
                capturer: Arc::new(capturer),
                injector: Arc::new(injector),
            })
        }
        BackendKind::Disabled => {
            info!("Desktop backend disabled");
            Ok(DesktopBackends {
                capturer: Arc::new(DisabledBackend),
                injector: Arc::new(DisabledBackend),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DesktopConfig::default();
        assert_eq!(config.backend, BackendKind::X11);
        assert_eq!(config.capture_command[0], "import");
        assert_eq!(config.xdotool, "xdotool");
    }

    #[test]
    fn test_disabled_backend_is_built() {
        let config = DesktopConfig {
            backend: BackendKind::Disabled,
            ..Default::default()
        };
        let backends = build_backends(&config).unwrap();
        assert_eq!(
            backends.capturer.screen_size().unwrap_err().code(),
            "unsupported"
        );
    }

    #[test]
    fn test_empty_capture_command_fails() {
        let config = DesktopConfig {
            capture_command: Vec::new(),
            ..Default::default()
        };
        assert!(build_backends(&config).is_err());
    }
}
