//! Desktop collaborator traits
//!
//! Screen sessions never touch the display directly. They call a
//! [`FrameCapturer`] and an [`InputInjector`] from the worker pool; concrete
//! backends live in `serverguard-desktop`.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Mouse button
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    /// Primary button
    #[default]
    Left,
    /// Middle button / wheel press
    Middle,
    /// Secondary button
    Right,
}

/// Grabs the screen as encoded JPEG
#[cfg_attr(test, mockall::automock)]
pub trait FrameCapturer: Send + Sync {
    /// Capture one frame at JPEG `quality` (10-100), resized by `scale`
    fn capture_frame(&self, quality: u8, scale: f32) -> Result<Vec<u8>>;

    /// Size of the captured display in pixels
    fn screen_size(&self) -> Result<(u32, u32)>;
}

/// Synthesises pointer and keyboard events
#[cfg_attr(test, mockall::automock)]
pub trait InputInjector: Send + Sync {
    /// Move the pointer
    fn move_to(&self, x: i32, y: i32) -> Result<()>;

    /// Click `clicks` times at a position
    fn click(&self, x: i32, y: i32, button: MouseButton, clicks: u32) -> Result<()>;

    /// Press at `from` (or the current position), move to `to`, release
    fn drag(&self, from: Option<(i32, i32)>, to: (i32, i32), button: MouseButton) -> Result<()>;

    /// Scroll at a position; positive is up
    fn scroll(&self, x: i32, y: i32, amount: i32) -> Result<()>;

    /// Press and release a key
    fn key_press(&self, key: &str) -> Result<()>;

    /// Press and hold a key
    fn key_down(&self, key: &str) -> Result<()>;

    /// Release a held key
    fn key_up(&self, key: &str) -> Result<()>;

    /// Type literal text
    fn type_text(&self, text: &str) -> Result<()>;

    /// Press keys together, then release in reverse order
    fn hotkey(&self, keys: &[String]) -> Result<()>;
}
