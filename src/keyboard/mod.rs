//! Keyboard event sources

mod event;
pub mod keymap;

#[cfg(target_os = "linux")]
mod evdev_listener;

pub use event::{KeyEvent, KeyEventType, KeyboardListener};
pub use keymap::{key_identifier, KeyCode, UNIDENTIFIED};

#[cfg(target_os = "linux")]
pub use evdev_listener::{evdev_status, EvdevError, EvdevListener};
