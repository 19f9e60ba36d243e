//! Key codes and browser-style key identifiers
//!
//! Key codes use the Linux evdev scancode numbering so that both the
//! device_query listener and the raw evdev listener agree on identity.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Identifier reported for scancodes missing from the table
pub const UNIDENTIFIED: &str = "Unidentified";

/// Represents a physical key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub fn new(code: u16) -> Self {
        Self(code)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Key identifier for this code, see [`key_identifier`]
    pub fn identifier(&self) -> &'static str {
        key_identifier(*self)
    }
}

impl From<u16> for KeyCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<device_query::Keycode> for KeyCode {
    fn from(keycode: device_query::Keycode) -> Self {
        use device_query::Keycode as DK;
        // Map device_query keycodes to Linux evdev scancodes
        let code = match keycode {
            DK::Escape => 1,
            DK::Key1 => 2,
            DK::Key2 => 3,
            DK::Key3 => 4,
            DK::Key4 => 5,
            DK::Key5 => 6,
            DK::Key6 => 7,
            DK::Key7 => 8,
            DK::Key8 => 9,
            DK::Key9 => 10,
            DK::Key0 => 11,
            DK::Minus => 12,
            DK::Equal => 13,
            DK::Backspace => 14,
            DK::Tab => 15,
            DK::Q => 16,
            DK::W => 17,
            DK::E => 18,
            DK::R => 19,
            DK::T => 20,
            DK::Y => 21,
            DK::U => 22,
            DK::I => 23,
            DK::O => 24,
            DK::P => 25,
            DK::LeftBracket => 26,
            DK::RightBracket => 27,
            DK::Enter => 28,
            DK::LControl => 29,
            DK::A => 30,
            DK::S => 31,
            DK::D => 32,
            DK::F => 33,
            DK::G => 34,
            DK::H => 35,
            DK::J => 36,
            DK::K => 37,
            DK::L => 38,
            DK::Semicolon => 39,
            DK::Apostrophe => 40,
            DK::Grave => 41,
            DK::LShift => 42,
            DK::BackSlash => 43,
            DK::Z => 44,
            DK::X => 45,
            DK::C => 46,
            DK::V => 47,
            DK::B => 48,
            DK::N => 49,
            DK::M => 50,
            DK::Comma => 51,
            DK::Dot => 52,
            DK::Slash => 53,
            DK::RShift => 54,
            DK::LAlt => 56,
            DK::Space => 57,
            DK::CapsLock => 58,
            DK::F1 => 59,
            DK::F2 => 60,
            DK::F3 => 61,
            DK::F4 => 62,
            DK::F5 => 63,
            DK::F6 => 64,
            DK::F7 => 65,
            DK::F8 => 66,
            DK::F9 => 67,
            DK::F10 => 68,
            DK::F11 => 87,
            DK::F12 => 88,
            DK::RControl => 97,
            DK::RAlt => 100,
            DK::Home => 102,
            DK::Up => 103,
            DK::PageUp => 104,
            DK::Left => 105,
            DK::Right => 106,
            DK::End => 107,
            DK::Down => 108,
            DK::PageDown => 109,
            DK::Insert => 110,
            DK::Delete => 111,
            DK::LMeta => 125,
            DK::RMeta => 126,
            // Numpad keys
            DK::Numpad0 => 82,
            DK::Numpad1 => 79,
            DK::Numpad2 => 80,
            DK::Numpad3 => 81,
            DK::Numpad4 => 75,
            DK::Numpad5 => 76,
            DK::Numpad6 => 77,
            DK::Numpad7 => 71,
            DK::Numpad8 => 72,
            DK::Numpad9 => 73,
            DK::NumpadSubtract => 74,
            DK::NumpadAdd => 78,
            DK::NumpadDivide => 98,
            DK::NumpadMultiply => 55,
            // Fallback for any unmapped keys
            _ => 0,
        };
        Self(code)
    }
}

/// Scancode to key identifier table.
///
/// Identifiers follow the DOM `KeyboardEvent.key` names for the unshifted US
/// layout: printable keys map to their character, everything else to its
/// named value. Left and right modifiers share one identifier.
pub static KEY_IDENTIFIERS: LazyLock<HashMap<KeyCode, &'static str>> = LazyLock::new(|| {
    let entries: &[(u16, &'static str)] = &[
        // Function row
        (1, "Escape"),
        (59, "F1"),
        (60, "F2"),
        (61, "F3"),
        (62, "F4"),
        (63, "F5"),
        (64, "F6"),
        (65, "F7"),
        (66, "F8"),
        (67, "F9"),
        (68, "F10"),
        (87, "F11"),
        (88, "F12"),
        // Number row
        (41, "`"),
        (2, "1"),
        (3, "2"),
        (4, "3"),
        (5, "4"),
        (6, "5"),
        (7, "6"),
        (8, "7"),
        (9, "8"),
        (10, "9"),
        (11, "0"),
        (12, "-"),
        (13, "="),
        (14, "Backspace"),
        // Top letter row
        (15, "Tab"),
        (16, "q"),
        (17, "w"),
        (18, "e"),
        (19, "r"),
        (20, "t"),
        (21, "y"),
        (22, "u"),
        (23, "i"),
        (24, "o"),
        (25, "p"),
        (26, "["),
        (27, "]"),
        (43, "\\"),
        // Home row
        (58, "CapsLock"),
        (30, "a"),
        (31, "s"),
        (32, "d"),
        (33, "f"),
        (34, "g"),
        (35, "h"),
        (36, "j"),
        (37, "k"),
        (38, "l"),
        (39, ";"),
        (40, "'"),
        (28, "Enter"),
        // Bottom letter row
        (42, "Shift"),
        (44, "z"),
        (45, "x"),
        (46, "c"),
        (47, "v"),
        (48, "b"),
        (49, "n"),
        (50, "m"),
        (51, ","),
        (52, "."),
        (53, "/"),
        (54, "Shift"),
        // Modifiers and space
        (29, "Control"),
        (97, "Control"),
        (56, "Alt"),
        (100, "Alt"),
        (125, "Meta"),
        (126, "Meta"),
        (127, "ContextMenu"),
        (57, " "),
        // Arrows and navigation
        (103, "ArrowUp"),
        (105, "ArrowLeft"),
        (108, "ArrowDown"),
        (106, "ArrowRight"),
        (110, "Insert"),
        (102, "Home"),
        (104, "PageUp"),
        (111, "Delete"),
        (107, "End"),
        (109, "PageDown"),
        // Numpad
        (82, "0"),
        (79, "1"),
        (80, "2"),
        (81, "3"),
        (75, "4"),
        (76, "5"),
        (77, "6"),
        (71, "7"),
        (72, "8"),
        (73, "9"),
        (74, "-"),
        (78, "+"),
        (98, "/"),
        (55, "*"),
    ];

    entries
        .iter()
        .map(|&(code, name)| (KeyCode(code), name))
        .collect()
});

/// Get the key identifier for a code, [`UNIDENTIFIED`] if not in the table
pub fn key_identifier(code: KeyCode) -> &'static str {
    KEY_IDENTIFIERS.get(&code).copied().unwrap_or(UNIDENTIFIED)
}
