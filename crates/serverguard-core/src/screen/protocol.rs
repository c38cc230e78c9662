//! Screen wire protocol
//!
//! The stream channel carries frames to the client; the control channel
//! carries input events from it. Both answer `ping` and send heartbeats.

use crate::desktop::MouseButton;
use serde::{Deserialize, Serialize};

/// Messages accepted on the stream channel
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamClientMessage {
    /// Liveness probe
    Ping,
    /// Any other `type`; ignored
    #[serde(other)]
    Unknown,
}

/// Messages accepted on the control channel
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlClientMessage {
    /// Input event; decoded separately so a bad event gets a `control_response`
    Control {
        /// Raw event payload
        data: serde_json::Value,
    },
    /// Liveness probe
    Ping,
    /// Any other `type`; ignored
    #[serde(other)]
    Unknown,
}

fn default_clicks() -> u32 {
    1
}

/// Input event carried in a control message's `data`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlCommand {
    /// Move the pointer
    MouseMove {
        /// Target x
        x: i32,
        /// Target y
        y: i32,
    },
    /// Click at a position
    MouseClick {
        /// Target x
        x: i32,
        /// Target y
        y: i32,
        /// Button, left by default
        #[serde(default)]
        button: MouseButton,
        /// Click count, one by default
        #[serde(default = "default_clicks")]
        clicks: u32,
    },
    /// Drag to a position
    MouseDrag {
        /// End x
        x: i32,
        /// End y
        y: i32,
        /// Start x; current pointer position when absent
        #[serde(default)]
        from_x: Option<i32>,
        /// Start y; current pointer position when absent
        #[serde(default)]
        from_y: Option<i32>,
        /// Button, left by default
        #[serde(default)]
        button: MouseButton,
    },
    /// Scroll at a position
    MouseScroll {
        /// Pointer x
        x: i32,
        /// Pointer y
        y: i32,
        /// Wheel clicks, positive scrolls up
        scroll: i32,
    },
    /// Press and release a key
    KeyPress {
        /// Key name
        key: String,
    },
    /// Press and hold a key
    KeyDown {
        /// Key name
        key: String,
    },
    /// Release a key
    KeyUp {
        /// Key name
        key: String,
    },
    /// Type text
    KeyType {
        /// Literal text
        text: String,
    },
    /// Key chord such as ctrl+c
    Hotkey {
        /// Keys in press order
        keys: Vec<String>,
    },
}

impl ControlCommand {
    /// Short name for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MouseMove { .. } => "mouse_move",
            Self::MouseClick { .. } => "mouse_click",
            Self::MouseDrag { .. } => "mouse_drag",
            Self::MouseScroll { .. } => "mouse_scroll",
            Self::KeyPress { .. } => "key_press",
            Self::KeyDown { .. } => "key_down",
            Self::KeyUp { .. } => "key_up",
            Self::KeyType { .. } => "key_type",
            Self::Hotkey { .. } => "hotkey",
        }
    }
}

/// Messages sent by the server on either channel
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScreenServerMessage {
    /// Display geometry, sent when a stream opens
    ScreenInfo {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// One captured frame
    Frame {
        /// Base64-encoded JPEG
        data: String,
        /// Capture time
        timestamp: String,
    },
    /// Outcome of a control event
    ControlResponse {
        /// Whether the event was injected
        success: bool,
        /// Failure reason
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Failure report
    Error {
        /// Error text
        message: String,
        /// Machine-readable error code
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
    /// Reply to `ping`
    Pong {
        /// ISO-8601 timestamp
        timestamp: String,
    },
    /// Sent after an idle receive timeout
    Heartbeat {
        /// ISO-8601 timestamp
        timestamp: String,
    },
}

impl ScreenServerMessage {
    /// Error without a code
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            code: None,
        }
    }

    /// Error with a code
    #[must_use]
    pub fn error_with_code(message: impl Into<String>, code: &str) -> Self {
        Self::Error {
            message: message.into(),
            code: Some(code.to_string()),
        }
    }

    /// Successful control response
    #[must_use]
    pub fn control_ok() -> Self {
        Self::ControlResponse {
            success: true,
            error: None,
        }
    }

    /// Failed control response
    #[must_use]
    pub fn control_failed(error: impl Into<String>) -> Self {
        Self::ControlResponse {
            success: false,
            error: Some(error.into()),
        }
    }

    /// Reply to `ping`
    #[must_use]
    pub fn pong() -> Self {
        Self::Pong {
            timestamp: crate::timestamp(),
        }
    }

    /// Idle heartbeat
    #[must_use]
    pub fn heartbeat() -> Self {
        Self::Heartbeat {
            timestamp: crate::timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_browser_control_events() {
        let cmd: ControlCommand =
            serde_json::from_value(json!({"type": "mouse_click", "x": 10, "y": 20, "button": "right"}))
                .unwrap();
        assert_eq!(
            cmd,
            ControlCommand::MouseClick {
                x: 10,
                y: 20,
                button: MouseButton::Right,
                clicks: 1
            }
        );

        let cmd: ControlCommand =
            serde_json::from_value(json!({"type": "mouse_scroll", "x": 1, "y": 2, "scroll": -3}))
                .unwrap();
        assert!(matches!(cmd, ControlCommand::MouseScroll { scroll: -3, .. }));

        let cmd: ControlCommand =
            serde_json::from_value(json!({"type": "key_type", "text": "hello"})).unwrap();
        assert_eq!(cmd.kind(), "key_type");
    }

    #[test]
    fn test_click_defaults_to_left_button() {
        let cmd: ControlCommand =
            serde_json::from_value(json!({"type": "mouse_click", "x": 0, "y": 0})).unwrap();
        assert!(matches!(
            cmd,
            ControlCommand::MouseClick {
                button: MouseButton::Left,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_control_event_fails_to_parse() {
        assert!(serde_json::from_value::<ControlCommand>(json!({"type": "teleport"})).is_err());
        assert!(serde_json::from_value::<ControlCommand>(json!({"type": "mouse_move", "x": 1})).is_err());
    }

    #[test]
    fn test_control_envelope_keeps_raw_data() {
        let msg: ControlClientMessage = serde_json::from_value(
            json!({"type": "control", "data": {"type": "hotkey", "keys": ["ctrl", "c"]}}),
        )
        .unwrap();
        let ControlClientMessage::Control { data } = msg else {
            panic!("expected control message");
        };
        assert_eq!(data["keys"][1], "c");
    }

    #[test]
    fn test_server_message_shapes() {
        let json = serde_json::to_value(ScreenServerMessage::control_ok()).unwrap();
        assert_eq!(json, json!({"type": "control_response", "success": true}));

        let json = serde_json::to_value(ScreenServerMessage::ScreenInfo {
            width: 1920,
            height: 1080,
        })
        .unwrap();
        assert_eq!(json, json!({"type": "screen_info", "width": 1920, "height": 1080}));
    }
}
