//! Control event dispatch

use super::protocol::ControlCommand;
use crate::desktop::InputInjector;
use crate::error::Result;

/// Inject one control event. Blocking; call from the worker pool.
pub fn apply(injector: &dyn InputInjector, command: &ControlCommand) -> Result<()> {
    match command {
        ControlCommand::MouseMove { x, y } => injector.move_to(*x, *y),
        ControlCommand::MouseClick {
            x,
            y,
            button,
            clicks,
        } => injector.click(*x, *y, *button, (*clicks).max(1)),
        ControlCommand::MouseDrag {
            x,
            y,
            from_x,
            from_y,
            button,
        } => {
            let from = from_x.zip(*from_y);
            injector.drag(from, (*x, *y), *button)
        }
        ControlCommand::MouseScroll { x, y, scroll } => injector.scroll(*x, *y, *scroll),
        ControlCommand::KeyPress { key } => injector.key_press(key),
        ControlCommand::KeyDown { key } => injector.key_down(key),
        ControlCommand::KeyUp { key } => injector.key_up(key),
        ControlCommand::KeyType { text } => injector.type_text(text),
        ControlCommand::Hotkey { keys } => injector.hotkey(keys),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desktop::{MockInputInjector, MouseButton};
    use crate::error::Error;
    use mockall::predicate::eq;

    #[test]
    fn test_click_forwards_button_and_count() {
        let mut injector = MockInputInjector::new();
        injector
            .expect_click()
            .with(eq(5), eq(6), eq(MouseButton::Right), eq(2))
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let cmd = ControlCommand::MouseClick {
            x: 5,
            y: 6,
            button: MouseButton::Right,
            clicks: 2,
        };
        apply(&injector, &cmd).unwrap();
    }

    #[test]
    fn test_drag_needs_both_start_coordinates() {
        let mut injector = MockInputInjector::new();
        injector
            .expect_drag()
            .with(eq(None), eq((100, 200)), eq(MouseButton::Left))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let cmd = ControlCommand::MouseDrag {
            x: 100,
            y: 200,
            from_x: Some(3),
            from_y: None,
            button: MouseButton::Left,
        };
        apply(&injector, &cmd).unwrap();
    }

    #[test]
    fn test_hotkey_passes_keys_in_order() {
        let mut injector = MockInputInjector::new();
        injector
            .expect_hotkey()
            .withf(|keys| keys == ["ctrl".to_string(), "shift".to_string(), "t".to_string()])
            .times(1)
            .returning(|_| Ok(()));

        let cmd = ControlCommand::Hotkey {
            keys: vec!["ctrl".into(), "shift".into(), "t".into()],
        };
        apply(&injector, &cmd).unwrap();
    }

    #[test]
    fn test_injection_failure_propagates() {
        let mut injector = MockInputInjector::new();
        injector
            .expect_type_text()
            .returning(|_| Err(Error::desktop("no display")));

        let cmd = ControlCommand::KeyType { text: "hi".into() };
        let err = apply(&injector, &cmd).unwrap_err();
        assert_eq!(err.code(), "desktop_error");
    }
}
