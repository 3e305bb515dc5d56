//! Key identifier mapping
//!
//! Recorded macros store keys by name (`"A"`, `"LEFT SHIFT"`, `"MOUSE LEFT"`)
//! rather than by platform code. This module converts captured rdev keys and
//! buttons into those names and resolves names back into the codes the
//! simulation backend understands. Lookup is case-insensitive, and names
//! with the `"MOUSE "` prefix go through the mouse button table.
//!
//! A name without a mapping is an expected outcome (some captured keys have
//! no simulation equivalent). `resolve` logs it and returns `None`.

use rdev::{Button, Key};
use tracing::warn;

/// Prefix marking a mouse button identifier
pub const MOUSE_PREFIX: &str = "MOUSE ";

/// Native code understood by the simulation backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeCode {
    Key(Key),
    Button(Button),
}

/// Resolve a key or mouse identifier to its native code
pub fn resolve(name: &str) -> Option<NativeCode> {
    let upper = name.to_uppercase();
    let code = match upper.strip_prefix(MOUSE_PREFIX) {
        Some(button) => mouse_button(button).map(NativeCode::Button),
        None => keyboard_key(&upper).map(NativeCode::Key),
    };
    if code.is_none() {
        warn!("No mapping found for key: {}", name);
    }
    code
}

/// The identifier a captured event carries for `name`, if it maps at all
///
/// Aliases collapse to one spelling: `"Esc"` and `"escape"` both give `"ESCAPE"`.
pub fn canonical_name(name: &str) -> Option<String> {
    resolve(name).map(|code| match code {
        NativeCode::Key(key) => key_name(key),
        NativeCode::Button(button) => button_name(button),
    })
}

/// Check whether an identifier names a mouse button
pub fn is_mouse(name: &str) -> bool {
    name.to_uppercase().starts_with(MOUSE_PREFIX)
}

fn mouse_button(name: &str) -> Option<Button> {
    match name {
        "LEFT" => Some(Button::Left),
        "RIGHT" => Some(Button::Right),
        "MIDDLE" => Some(Button::Middle),
        other => other
            .strip_prefix("BUTTON ")
            .and_then(|n| n.parse::<u8>().ok())
            .map(Button::Unknown),
    }
}

fn keyboard_key(name: &str) -> Option<Key> {
    let key = match name {
        "ESCAPE" | "ESC" => Key::Escape,
        "F1" => Key::F1,
        "F2" => Key::F2,
        "F3" => Key::F3,
        "F4" => Key::F4,
        "F5" => Key::F5,
        "F6" => Key::F6,
        "F7" => Key::F7,
        "F8" => Key::F8,
        "F9" => Key::F9,
        "F10" => Key::F10,
        "F11" => Key::F11,
        "F12" => Key::F12,

        "GRAVE" | "BACKTICK" => Key::BackQuote,
        "1" => Key::Num1,
        "2" => Key::Num2,
        "3" => Key::Num3,
        "4" => Key::Num4,
        "5" => Key::Num5,
        "6" => Key::Num6,
        "7" => Key::Num7,
        "8" => Key::Num8,
        "9" => Key::Num9,
        "0" => Key::Num0,
        "MINUS" => Key::Minus,
        "EQUAL" | "EQUALS" => Key::Equal,
        "BACKSPACE" => Key::Backspace,

        "INSERT" | "INS" => Key::Insert,
        "HOME" => Key::Home,
        "PAGE UP" => Key::PageUp,
        "PAGE DOWN" => Key::PageDown,
        "DELETE" => Key::Delete,
        "END" => Key::End,
        "NUM LOCK" => Key::NumLock,
        "CAPS LOCK" => Key::CapsLock,
        "SCROLL LOCK" => Key::ScrollLock,
        "PRINT SCREEN" => Key::PrintScreen,
        "PAUSE" => Key::Pause,
        "TAB" => Key::Tab,
        "SPACE" => Key::Space,
        "ENTER" | "RETURN" => Key::Return,

        "Q" => Key::KeyQ,
        "W" => Key::KeyW,
        "E" => Key::KeyE,
        "R" => Key::KeyR,
        "T" => Key::KeyT,
        "Y" => Key::KeyY,
        "U" => Key::KeyU,
        "I" => Key::KeyI,
        "O" => Key::KeyO,
        "P" => Key::KeyP,
        "A" => Key::KeyA,
        "S" => Key::KeyS,
        "D" => Key::KeyD,
        "F" => Key::KeyF,
        "G" => Key::KeyG,
        "H" => Key::KeyH,
        "J" => Key::KeyJ,
        "K" => Key::KeyK,
        "L" => Key::KeyL,
        "Z" => Key::KeyZ,
        "X" => Key::KeyX,
        "C" => Key::KeyC,
        "V" => Key::KeyV,
        "B" => Key::KeyB,
        "N" => Key::KeyN,
        "M" => Key::KeyM,

        "LEFT BRACKET" | "SQUARE BRACKET OPEN" => Key::LeftBracket,
        "RIGHT BRACKET" | "SQUARE BRACKET CLOSE" => Key::RightBracket,
        "BACKSLASH" => Key::BackSlash,
        "SECTION" => Key::IntlBackslash,
        "SEMICOLON" => Key::SemiColon,
        "QUOTE" => Key::Quote,
        "COMMA" => Key::Comma,
        "DOT" | "PERIOD" => Key::Dot,
        "SLASH" | "FORWARD SLASH" => Key::Slash,

        "LEFT SHIFT" => Key::ShiftLeft,
        "RIGHT SHIFT" => Key::ShiftRight,
        "LEFT CTRL" | "LEFT CONTROL" => Key::ControlLeft,
        "RIGHT CTRL" | "RIGHT CONTROL" => Key::ControlRight,
        "LEFT ALT" | "LEFT OPTION" => Key::Alt,
        "RIGHT ALT" | "RIGHT OPTION" => Key::AltGr,
        "LEFT META" | "LEFT CMD" | "LEFT COMMAND" | "LEFT SUPER" | "LEFT WIN" => Key::MetaLeft,
        "RIGHT META" | "RIGHT CMD" | "RIGHT COMMAND" | "RIGHT SUPER" | "RIGHT WIN" => {
            Key::MetaRight
        }
        "FN" | "FUNCTION" => Key::Function,

        "UP ARROW" | "UP" => Key::UpArrow,
        "DOWN ARROW" | "DOWN" => Key::DownArrow,
        "LEFT ARROW" | "LEFT" => Key::LeftArrow,
        "RIGHT ARROW" | "RIGHT" => Key::RightArrow,

        "NUMPAD 0" => Key::Kp0,
        "NUMPAD 1" => Key::Kp1,
        "NUMPAD 2" => Key::Kp2,
        "NUMPAD 3" => Key::Kp3,
        "NUMPAD 4" => Key::Kp4,
        "NUMPAD 5" => Key::Kp5,
        "NUMPAD 6" => Key::Kp6,
        "NUMPAD 7" => Key::Kp7,
        "NUMPAD 8" => Key::Kp8,
        "NUMPAD 9" => Key::Kp9,
        "NUMPAD RETURN" | "NUMPAD ENTER" => Key::KpReturn,
        "NUMPAD MINUS" => Key::KpMinus,
        "NUMPAD PLUS" => Key::KpPlus,
        "NUMPAD MULTIPLY" => Key::KpMultiply,
        "NUMPAD DIVIDE" => Key::KpDivide,
        "NUMPAD DOT" | "NUMPAD DECIMAL" => Key::KpDelete,

        _ => return None,
    };
    Some(key)
}

/// Canonical identifier for a captured key
pub fn key_name(key: Key) -> String {
    let name = match key {
        Key::Escape => "ESCAPE",
        Key::F1 => "F1",
        Key::F2 => "F2",
        Key::F3 => "F3",
        Key::F4 => "F4",
        Key::F5 => "F5",
        Key::F6 => "F6",
        Key::F7 => "F7",
        Key::F8 => "F8",
        Key::F9 => "F9",
        Key::F10 => "F10",
        Key::F11 => "F11",
        Key::F12 => "F12",
        Key::BackQuote => "GRAVE",
        Key::Num1 => "1",
        Key::Num2 => "2",
        Key::Num3 => "3",
        Key::Num4 => "4",
        Key::Num5 => "5",
        Key::Num6 => "6",
        Key::Num7 => "7",
        Key::Num8 => "8",
        Key::Num9 => "9",
        Key::Num0 => "0",
        Key::Minus => "MINUS",
        Key::Equal => "EQUAL",
        Key::Backspace => "BACKSPACE",
        Key::Insert => "INSERT",
        Key::Home => "HOME",
        Key::PageUp => "PAGE UP",
        Key::PageDown => "PAGE DOWN",
        Key::Delete => "DELETE",
        Key::End => "END",
        Key::NumLock => "NUM LOCK",
        Key::CapsLock => "CAPS LOCK",
        Key::ScrollLock => "SCROLL LOCK",
        Key::PrintScreen => "PRINT SCREEN",
        Key::Pause => "PAUSE",
        Key::Tab => "TAB",
        Key::Space => "SPACE",
        Key::Return => "ENTER",
        Key::KeyQ => "Q",
        Key::KeyW => "W",
        Key::KeyE => "E",
        Key::KeyR => "R",
        Key::KeyT => "T",
        Key::KeyY => "Y",
        Key::KeyU => "U",
        Key::KeyI => "I",
        Key::KeyO => "O",
        Key::KeyP => "P",
        Key::KeyA => "A",
        Key::KeyS => "S",
        Key::KeyD => "D",
        Key::KeyF => "F",
        Key::KeyG => "G",
        Key::KeyH => "H",
        Key::KeyJ => "J",
        Key::KeyK => "K",
        Key::KeyL => "L",
        Key::KeyZ => "Z",
        Key::KeyX => "X",
        Key::KeyC => "C",
        Key::KeyV => "V",
        Key::KeyB => "B",
        Key::KeyN => "N",
        Key::KeyM => "M",
        Key::LeftBracket => "LEFT BRACKET",
        Key::RightBracket => "RIGHT BRACKET",
        Key::BackSlash => "BACKSLASH",
        Key::IntlBackslash => "SECTION",
        Key::SemiColon => "SEMICOLON",
        Key::Quote => "QUOTE",
        Key::Comma => "COMMA",
        Key::Dot => "DOT",
        Key::Slash => "SLASH",
        Key::ShiftLeft => "LEFT SHIFT",
        Key::ShiftRight => "RIGHT SHIFT",
        Key::ControlLeft => "LEFT CTRL",
        Key::ControlRight => "RIGHT CTRL",
        Key::Alt => "LEFT ALT",
        Key::AltGr => "RIGHT ALT",
        Key::MetaLeft => "LEFT META",
        Key::MetaRight => "RIGHT META",
        Key::Function => "FN",
        Key::UpArrow => "UP ARROW",
        Key::DownArrow => "DOWN ARROW",
        Key::LeftArrow => "LEFT ARROW",
        Key::RightArrow => "RIGHT ARROW",
        Key::Kp0 => "NUMPAD 0",
        Key::Kp1 => "NUMPAD 1",
        Key::Kp2 => "NUMPAD 2",
        Key::Kp3 => "NUMPAD 3",
        Key::Kp4 => "NUMPAD 4",
        Key::Kp5 => "NUMPAD 5",
        Key::Kp6 => "NUMPAD 6",
        Key::Kp7 => "NUMPAD 7",
        Key::Kp8 => "NUMPAD 8",
        Key::Kp9 => "NUMPAD 9",
        Key::KpReturn => "NUMPAD RETURN",
        Key::KpMinus => "NUMPAD MINUS",
        Key::KpPlus => "NUMPAD PLUS",
        Key::KpMultiply => "NUMPAD MULTIPLY",
        Key::KpDivide => "NUMPAD DIVIDE",
        Key::KpDelete => "NUMPAD DOT",
        Key::Unknown(code) => return format!("UNKNOWN {}", code),
    };
    name.to_string()
}

/// Canonical identifier for a captured mouse button
pub fn button_name(button: Button) -> String {
    match button {
        Button::Left => format!("{}LEFT", MOUSE_PREFIX),
        Button::Right => format!("{}RIGHT", MOUSE_PREFIX),
        Button::Middle => format!("{}MIDDLE", MOUSE_PREFIX),
        Button::Unknown(n) => format!("{}BUTTON {}", MOUSE_PREFIX, n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_KEYS: &[Key] = &[
        Key::Escape,
        Key::F9,
        Key::Num0,
        Key::KeyA,
        Key::KeyZ,
        Key::ShiftLeft,
        Key::ControlRight,
        Key::Alt,
        Key::MetaLeft,
        Key::Return,
        Key::UpArrow,
        Key::Kp5,
        Key::KpDelete,
        Key::IntlBackslash,
    ];

    #[test]
    fn test_case_insensitive() {
        for name in ["A", "LEFT SHIFT", "Page Up", "numpad 7", "mouse left"] {
            assert_eq!(resolve(name), resolve(&name.to_lowercase()));
            assert_eq!(resolve(name), resolve(&name.to_uppercase()));
            assert!(resolve(name).is_some(), "{} should resolve", name);
        }
    }

    #[test]
    fn test_captured_names_resolve_back() {
        for key in SAMPLE_KEYS {
            assert_eq!(resolve(&key_name(*key)), Some(NativeCode::Key(*key)));
        }
        for button in [Button::Left, Button::Right, Button::Middle, Button::Unknown(4)] {
            assert_eq!(resolve(&button_name(button)), Some(NativeCode::Button(button)));
        }
    }

    #[test]
    fn test_platform_aliases() {
        assert_eq!(resolve("LEFT CMD"), Some(NativeCode::Key(Key::MetaLeft)));
        assert_eq!(resolve("left win"), Some(NativeCode::Key(Key::MetaLeft)));
        assert_eq!(resolve("LEFT OPTION"), Some(NativeCode::Key(Key::Alt)));
        assert_eq!(resolve("RIGHT CONTROL"), Some(NativeCode::Key(Key::ControlRight)));
        assert_eq!(resolve("RETURN"), resolve("ENTER"));
    }

    #[test]
    fn test_mouse_prefix_uses_button_table() {
        assert_eq!(resolve("MOUSE RIGHT"), Some(NativeCode::Button(Button::Right)));
        // "LEFT" alone is the arrow key, not the mouse button
        assert_eq!(resolve("LEFT"), Some(NativeCode::Key(Key::LeftArrow)));
        assert!(is_mouse("Mouse Middle"));
        assert!(!is_mouse("MIDDLE"));
    }

    #[test]
    fn test_canonical_name_collapses_aliases() {
        assert_eq!(canonical_name("Esc").as_deref(), Some("ESCAPE"));
        assert_eq!(canonical_name("return"), canonical_name("ENTER"));
        assert_eq!(
            canonical_name("LEFT CONTROL").as_deref(),
            Some(key_name(Key::ControlLeft).as_str())
        );
        assert_eq!(canonical_name("mouse left").as_deref(), Some("MOUSE LEFT"));
        assert_eq!(canonical_name("NOPE"), None);
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(resolve("NONEXISTENT_KEY"), None);
        assert_eq!(resolve("MOUSE NONEXISTENT"), None);
        assert_eq!(resolve(&key_name(Key::Unknown(255))), None);
        assert_eq!(resolve(""), None);
    }
}
