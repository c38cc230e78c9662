//! X11 backends driven by external helpers
//!
//! Frames come from a configurable capture command (ImageMagick `import` by
//! default) that writes a JPEG to stdout. Input and geometry go through
//! `xdotool`.

use crate::command::HelperCommand;
use crate::error::{Error, Result};
use crate::keys;
use serverguard_core::desktop::{FrameCapturer, InputInjector, MouseButton};
use tracing::debug;

/// Default capture command template
pub const DEFAULT_CAPTURE_COMMAND: &[&str] = &[
    "import",
    "-window",
    "root",
    "-quality",
    "{quality}",
    "-resize",
    "{percent}%",
    "jpeg:-",
];

const JPEG_MAGIC: [u8; 2] = [0xFF, 0xD8];

/// Expand `{quality}`, `{percent}` and `{scale}` in a capture template
#[must_use]
pub fn expand_template(template: &[String], quality: u8, scale: f32) -> Vec<String> {
    let percent = ((scale * 100.0).round() as i64).max(1).to_string();
    let quality = quality.to_string();
    let scale = format!("{scale:.2}");
    template
        .iter()
        .map(|arg| {
            arg.replace("{quality}", &quality)
                .replace("{percent}", &percent)
                .replace("{scale}", &scale)
        })
        .collect()
}

/// Parse `xdotool getdisplaygeometry` output ("1920 1080")
pub fn parse_geometry(output: &str) -> Option<(u32, u32)> {
    let mut parts = output.split_whitespace();
    let width = parts.next()?.parse().ok()?;
    let height = parts.next()?.parse().ok()?;
    if parts.next().is_some() || width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}

/// Captures frames with an external command
#[derive(Debug, Clone)]
pub struct ExternalCapturer {
    capture: HelperCommand,
    template: Vec<String>,
    geometry: HelperCommand,
}

impl ExternalCapturer {
    /// Build from a command template; the first element is the program
    pub fn new(command: &[String], xdotool: &str, display: Option<String>) -> Result<Self> {
        let (program, template) = command
            .split_first()
            .ok_or_else(|| Error::InvalidConfig("capture_command is empty".into()))?;

        Ok(Self {
            capture: HelperCommand::new(program.clone(), display.clone()),
            template: template.to_vec(),
            geometry: HelperCommand::new(xdotool, display),
        })
    }

    fn grab(&self, quality: u8, scale: f32) -> Result<Vec<u8>> {
        let args = expand_template(&self.template, quality, scale);
        let frame = self.capture.run(&args)?;
        if !frame.starts_with(&JPEG_MAGIC) {
            return Err(Error::Parse {
                program: self.capture.program().to_string(),
                output: format!("{} bytes without a JPEG header", frame.len()),
            });
        }
        debug!(quality, scale, bytes = frame.len(), "Captured frame");
        Ok(frame)
    }

    fn geometry(&self) -> Result<(u32, u32)> {
        let out = self.geometry.run(&["getdisplaygeometry"])?;
        let text = String::from_utf8_lossy(&out);
        parse_geometry(&text).ok_or_else(|| Error::Parse {
            program: self.geometry.program().to_string(),
            output: text.trim().to_string(),
        })
    }
}

impl FrameCapturer for ExternalCapturer {
    fn capture_frame(&self, quality: u8, scale: f32) -> serverguard_core::Result<Vec<u8>> {
        Ok(self.grab(quality, scale)?)
    }

    fn screen_size(&self) -> serverguard_core::Result<(u32, u32)> {
        Ok(self.geometry()?)
    }
}

fn button_number(button: MouseButton) -> &'static str {
    match button {
        MouseButton::Left => "1",
        MouseButton::Middle => "2",
        MouseButton::Right => "3",
    }
}

fn point(x: i32, y: i32) -> [String; 3] {
    ["mousemove".into(), x.to_string(), y.to_string()]
}

/// xdotool arguments for a click
#[must_use]
pub fn click_args(x: i32, y: i32, button: MouseButton, clicks: u32) -> Vec<String> {
    let mut args = point(x, y).to_vec();
    args.extend([
        "click".into(),
        "--repeat".into(),
        clicks.max(1).to_string(),
        button_number(button).into(),
    ]);
    args
}

/// xdotool arguments for a drag
#[must_use]
pub fn drag_args(from: Option<(i32, i32)>, to: (i32, i32), button: MouseButton) -> Vec<String> {
    let mut args = Vec::new();
    if let Some((x, y)) = from {
        args.extend(point(x, y));
    }
    args.extend(["mousedown".into(), button_number(button).into()]);
    args.extend(point(to.0, to.1));
    args.extend(["mouseup".into(), button_number(button).into()]);
    args
}

/// xdotool arguments for a scroll; positive amounts scroll up
#[must_use]
pub fn scroll_args(x: i32, y: i32, amount: i32) -> Vec<String> {
    let mut args = point(x, y).to_vec();
    if amount == 0 {
        return args;
    }
    let wheel = if amount > 0 { "4" } else { "5" };
    args.extend([
        "click".into(),
        "--repeat".into(),
        amount.unsigned_abs().to_string(),
        wheel.into(),
    ]);
    args
}

/// Injects input with xdotool
#[derive(Debug, Clone)]
pub struct XdotoolInjector {
    xdotool: HelperCommand,
}

impl XdotoolInjector {
    /// Create an injector using the given xdotool binary
    #[must_use]
    pub fn new(xdotool: &str, display: Option<String>) -> Self {
        Self {
            xdotool: HelperCommand::new(xdotool, display),
        }
    }

    fn exec<S: AsRef<str>>(&self, args: &[S]) -> serverguard_core::Result<()> {
        self.xdotool.run(args)?;
        Ok(())
    }
}

impl InputInjector for XdotoolInjector {
    fn move_to(&self, x: i32, y: i32) -> serverguard_core::Result<()> {
        self.exec(&point(x, y))
    }

    fn click(&self, x: i32, y: i32, button: MouseButton, clicks: u32) -> serverguard_core::Result<()> {
        self.exec(&click_args(x, y, button, clicks))
    }

    fn drag(
        &self,
        from: Option<(i32, i32)>,
        to: (i32, i32),
        button: MouseButton,
    ) -> serverguard_core::Result<()> {
        self.exec(&drag_args(from, to, button))
    }

    fn scroll(&self, x: i32, y: i32, amount: i32) -> serverguard_core::Result<()> {
        self.exec(&scroll_args(x, y, amount))
    }

    fn key_press(&self, key: &str) -> serverguard_core::Result<()> {
        self.exec(&["key".to_string(), keys::to_keysym(key)])
    }

    fn key_down(&self, key: &str) -> serverguard_core::Result<()> {
        self.exec(&["keydown".to_string(), keys::to_keysym(key)])
    }

    fn key_up(&self, key: &str) -> serverguard_core::Result<()> {
        self.exec(&["keyup".to_string(), keys::to_keysym(key)])
    }

    fn type_text(&self, text: &str) -> serverguard_core::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.exec(&["type", "--", text])
    }

    fn hotkey(&self, keys: &[String]) -> serverguard_core::Result<()> {
        if keys.is_empty() {
            return Err(serverguard_core::Error::protocol("hotkey needs at least one key"));
        }
        self.exec(&["key".to_string(), keys::chord(keys)])
    }
}
