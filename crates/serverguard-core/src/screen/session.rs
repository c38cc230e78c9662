//! Screen session state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Lowest JPEG quality
pub const MIN_QUALITY: u8 = 10;
/// Highest JPEG quality
pub const MAX_QUALITY: u8 = 100;
/// Smallest resize factor
pub const MIN_SCALE: f32 = 0.1;
/// Largest resize factor
pub const MAX_SCALE: f32 = 2.0;
/// Lowest frame rate
pub const MIN_FPS: u32 = 1;
/// Highest frame rate
pub const MAX_FPS: u32 = 30;

/// Capture parameters, always within their bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenSettings {
    /// JPEG quality, 10-100
    pub quality: u8,
    /// Resize factor, 0.1-2.0
    pub scale: f32,
    /// Frames per second, 1-30
    pub fps: u32,
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self {
            quality: 75,
            scale: 1.0,
            fps: 10,
        }
    }
}

impl ScreenSettings {
    /// Delay between frames
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(MIN_FPS)))
    }

    /// Apply an update, clamping each supplied value into range
    pub fn apply(&mut self, update: &SettingsUpdate) {
        if let Some(quality) = update.quality {
            self.quality = quality.clamp(i64::from(MIN_QUALITY), i64::from(MAX_QUALITY)) as u8;
        }
        if let Some(scale) = update.scale.filter(|s| s.is_finite()) {
            self.scale = scale.clamp(f64::from(MIN_SCALE), f64::from(MAX_SCALE)) as f32;
        }
        if let Some(fps) = update.fps {
            self.fps = fps.clamp(i64::from(MIN_FPS), i64::from(MAX_FPS)) as u32;
        }
    }

    /// These settings with every field clamped into range
    #[must_use]
    pub fn clamped(self) -> Self {
        let mut out = Self::default();
        out.apply(&SettingsUpdate {
            quality: Some(i64::from(self.quality)),
            scale: Some(f64::from(self.scale)),
            fps: Some(i64::from(self.fps)),
        });
        out
    }
}

/// Partial settings change as sent by clients; values may be out of range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    /// New JPEG quality
    #[serde(default)]
    pub quality: Option<i64>,
    /// New resize factor
    #[serde(default)]
    pub scale: Option<f64>,
    /// New frame rate
    #[serde(default)]
    pub fps: Option<i64>,
}

/// State of one screen-sharing session
#[derive(Debug)]
pub struct ScreenSession {
    id: String,
    settings: RwLock<ScreenSettings>,
    active: AtomicBool,
    created_at: DateTime<Utc>,
}

impl ScreenSession {
    /// Create an active session
    #[must_use]
    pub fn new(id: impl Into<String>, settings: ScreenSettings) -> Self {
        Self {
            id: id.into(),
            settings: RwLock::new(settings.clamped()),
            active: AtomicBool::new(true),
            created_at: Utc::now(),
        }
    }

    /// Session id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// When the session was created
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current capture settings
    pub async fn settings(&self) -> ScreenSettings {
        *self.settings.read().await
    }

    /// Apply a clamped update and return the effective settings
    pub async fn update_settings(&self, update: &SettingsUpdate) -> ScreenSettings {
        let mut settings = self.settings.write().await;
        settings.apply(update);
        *settings
    }

    /// Whether the capture loop should keep running
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stop the capture loop at its next check
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let mut settings = ScreenSettings::default();
        settings.apply(&SettingsUpdate {
            quality: Some(500),
            scale: Some(0.0),
            fps: Some(0),
        });
        assert_eq!(settings.quality, 100);
        assert!((settings.scale - 0.1).abs() < f32::EPSILON);
        assert_eq!(settings.fps, 1);

        settings.apply(&SettingsUpdate {
            quality: Some(-4),
            scale: Some(9.5),
            fps: Some(240),
        });
        assert_eq!(settings.quality, 10);
        assert!((settings.scale - 2.0).abs() < f32::EPSILON);
        assert_eq!(settings.fps, 30);
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut settings = ScreenSettings::default();
        settings.apply(&SettingsUpdate {
            fps: Some(5),
            ..Default::default()
        });
        assert_eq!(settings.quality, 75);
        assert_eq!(settings.fps, 5);
    }

    #[test]
    fn test_non_finite_scale_ignored() {
        let mut settings = ScreenSettings::default();
        settings.apply(&SettingsUpdate {
            scale: Some(f64::NAN),
            ..Default::default()
        });
        assert!((settings.scale - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_interval_follows_fps() {
        let settings = ScreenSettings {
            fps: 4,
            ..Default::default()
        };
        assert_eq!(settings.interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_update_deserializes_partial_json() {
        let update: SettingsUpdate = serde_json::from_str(r#"{"quality": 500}"#).unwrap();
        assert_eq!(update.quality, Some(500));
        assert!(update.fps.is_none());
    }

    #[tokio::test]
    async fn test_session_starts_active_with_clamped_settings() {
        let session = ScreenSession::new(
            "s1",
            ScreenSettings {
                quality: 3,
                scale: 1.0,
                fps: 99,
            },
        );
        assert!(session.is_active());
        let settings = session.settings().await;
        assert_eq!(settings.quality, 10);
        assert_eq!(settings.fps, 30);

        session.deactivate();
        assert!(!session.is_active());
    }
}
