//! Backend for headless hosts

use serverguard_core::desktop::{FrameCapturer, InputInjector, MouseButton};
use serverguard_core::{Error, Result};

/// Refuses every capture and input request
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledBackend;

fn capture_disabled<T>() -> Result<T> {
    Err(Error::Unsupported("screen capture is disabled on this server".into()))
}

fn input_disabled<T>() -> Result<T> {
    Err(Error::Unsupported("input injection is disabled on this server".into()))
}

impl FrameCapturer for DisabledBackend {
    fn capture_frame(&self, _quality: u8, _scale: f32) -> Result<Vec<u8>> {
        capture_disabled()
    }

    fn screen_size(&self) -> Result<(u32, u32)> {
        capture_disabled()
    }
}

impl InputInjector for DisabledBackend {
    fn move_to(&self, _x: i32, _y: i32) -> Result<()> {
        input_disabled()
    }

    fn click(&self, _x: i32, _y: i32, _button: MouseButton, _clicks: u32) -> Result<()> {
        input_disabled()
    }

    fn drag(&self, _from: Option<(i32, i32)>, _to: (i32, i32), _button: MouseButton) -> Result<()> {
        input_disabled()
    }

    fn scroll(&self, _x: i32, _y: i32, _amount: i32) -> Result<()> {
        input_disabled()
    }

    fn key_press(&self, _key: &str) -> Result<()> {
        input_disabled()
    }

    fn key_down(&self, _key: &str) -> Result<()> {
        input_disabled()
    }

    fn key_up(&self, _key: &str) -> Result<()> {
        input_disabled()
    }

    fn type_text(&self, _text: &str) -> Result<()> {
        input_disabled()
    }

    fn hotkey(&self, _keys: &[String]) -> Result<()> {
        input_disabled()
    }
}
