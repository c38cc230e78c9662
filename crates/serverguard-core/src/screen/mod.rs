//! Remote screen sessions
//!
//! Frame capture with live quality/scale/fps settings, plus a control
//! channel that injects pointer and keyboard events.

pub mod control;
pub mod engine;
pub mod protocol;
pub mod session;


pub use engine::ScreenEngine;
pub use protocol::{ControlCommand, ScreenServerMessage};
pub use session::{ScreenSession, ScreenSettings, SettingsUpdate};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Screen engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// Initial JPEG quality for new sessions
    #[serde(default = "default_quality")]
    pub quality: u8,
    /// Initial resize factor for new sessions
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Initial frame rate for new sessions
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Pause after a failed capture, in milliseconds
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
    /// Seconds without client traffic before a heartbeat is sent
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_quality() -> u8 {
    75
}

fn default_scale() -> f32 {
    1.0
}

fn default_fps() -> u32 {
    10
}

fn default_error_backoff_ms() -> u64 {
    1000
}

fn default_idle_timeout_secs() -> u64 {
    300
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            scale: default_scale(),
            fps: default_fps(),
            error_backoff_ms: default_error_backoff_ms(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl ScreenConfig {
    /// Clamped settings for new sessions
    #[must_use]
    pub fn default_settings(&self) -> ScreenSettings {
        ScreenSettings {
            quality: self.quality,
            scale: self.scale,
            fps: self.fps,
        }
        .clamped()
    }

    /// Idle receive timeout
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Pause after a failed capture
    #[must_use]
    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}
