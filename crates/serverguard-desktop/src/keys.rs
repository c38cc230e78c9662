//! Key name translation
//!
//! Browsers report keys by `KeyboardEvent.key` names ("Enter", "ArrowUp",
//! "."), and users type short aliases ("ctrl", "esc"). xdotool wants X
//! keysym names. Anything not listed passes through unchanged.

/// Named keys, matched case-insensitively
const NAMED_KEYS: &[(&str, &str)] = &[
    ("enter", "Return"),
    ("return", "Return"),
    ("backspace", "BackSpace"),
    ("tab", "Tab"),
    ("escape", "Escape"),
    ("esc", "Escape"),
    ("space", "space"),
    ("spacebar", "space"),
    ("delete", "Delete"),
    ("del", "Delete"),
    ("insert", "Insert"),
    ("home", "Home"),
    ("end", "End"),
    ("pageup", "Prior"),
    ("pagedown", "Next"),
    ("arrowup", "Up"),
    ("arrowdown", "Down"),
    ("arrowleft", "Left"),
    ("arrowright", "Right"),
    ("up", "Up"),
    ("down", "Down"),
    ("left", "Left"),
    ("right", "Right"),
    ("control", "ctrl"),
    ("ctrl", "ctrl"),
    ("shift", "shift"),
    ("alt", "alt"),
    ("option", "alt"),
    ("meta", "super"),
    ("super", "super"),
    ("win", "super"),
    ("cmd", "super"),
    ("command", "super"),
    ("capslock", "Caps_Lock"),
    ("numlock", "Num_Lock"),
    ("scrolllock", "Scroll_Lock"),
    ("printscreen", "Print"),
    ("pause", "Pause"),
    ("contextmenu", "Menu"),
];

/// Punctuation keys, matched exactly
const SYMBOL_KEYS: &[(&str, &str)] = &[
    (" ", "space"),
    (".", "period"),
    (",", "comma"),
    ("/", "slash"),
    ("\\", "backslash"),
    ("-", "minus"),
    ("=", "equal"),
    (";", "semicolon"),
    ("'", "apostrophe"),
    ("`", "grave"),
    ("[", "bracketleft"),
    ("]", "bracketright"),
    ("+", "plus"),
    ("*", "asterisk"),
    ("!", "exclam"),
    ("@", "at"),
    ("#", "numbersign"),
    ("$", "dollar"),
    ("%", "percent"),
    ("^", "asciicircum"),
    ("&", "ampersand"),
    ("(", "parenleft"),
    (")", "parenright"),
    ("_", "underscore"),
    (":", "colon"),
    ("\"", "quotedbl"),
    ("<", "less"),
    (">", "greater"),
    ("?", "question"),
    ("{", "braceleft"),
    ("}", "braceright"),
    ("|", "bar"),
    ("~", "asciitilde"),
];

/// Translate a client key name into an X keysym
#[must_use]
pub fn to_keysym(key: &str) -> String {
    if let Some((_, sym)) = SYMBOL_KEYS.iter().find(|(name, _)| *name == key) {
        return (*sym).to_string();
    }

    let lowered = key.to_ascii_lowercase();
    if let Some((_, sym)) = NAMED_KEYS.iter().find(|(name, _)| *name == lowered) {
        return (*sym).to_string();
    }

    // F1..F24
    if lowered.len() > 1 && lowered.starts_with('f') && lowered[1..].chars().all(|c| c.is_ascii_digit()) {
        return lowered.to_ascii_uppercase();
    }

    key.to_string()
}

/// Join keys into an xdotool chord such as `ctrl+shift+t`
#[must_use]
pub fn chord(keys: &[String]) -> String {
    keys.iter()
        .map(|k| to_keysym(k))
        .collect::<Vec<_>>()
        .join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_names() {
        assert_eq!(to_keysym("Enter"), "Return");
        assert_eq!(to_keysym("Backspace"), "BackSpace");
        assert_eq!(to_keysym("ArrowLeft"), "Left");
        assert_eq!(to_keysym("PageDown"), "Next");
        assert_eq!(to_keysym("Meta"), "super");
    }

    #[test]
    fn test_aliases_are_case_insensitive() {
        assert_eq!(to_keysym("ESC"), "Escape");
        assert_eq!(to_keysym("Ctrl"), "ctrl");
    }

    #[test]
    fn test_function_keys() {
        assert_eq!(to_keysym("f5"), "F5");
        assert_eq!(to_keysym("F12"), "F12");
        assert_eq!(to_keysym("f"), "f");
    }

    #[test]
    fn test_punctuation_and_passthrough() {
        assert_eq!(to_keysym("."), "period");
        assert_eq!(to_keysym(" "), "space");
        assert_eq!(to_keysym("a"), "a");
        assert_eq!(to_keysym("A"), "A");
        assert_eq!(to_keysym("7"), "7");
    }

    #[test]
    fn test_chord() {
        let keys = vec!["Control".to_string(), "Shift".to_string(), "t".to_string()];
        assert_eq!(chord(&keys), "ctrl+shift+t");
    }
}
