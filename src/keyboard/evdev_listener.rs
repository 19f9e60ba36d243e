//! Raw evdev-based keyboard listener for Linux
//!
//! Reads key events straight from `/dev/input/event*`, which keeps capturing
//! when no X11/Wayland session is available to device_query.

use super::{KeyCode, KeyEvent, KeyEventType};
use log::{debug, warn};
use nix::libc;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Instant;
use thiserror::Error;

/// Error type for evdev operations
#[derive(Debug, Error)]
pub enum EvdevError {
    #[error("No keyboard devices found")]
    NoDevices,
    #[error("Permission denied accessing {0}")]
    PermissionDenied(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Device enumeration failed: {0}")]
    EnumerationFailed(String),
}

/// A raw input event from the kernel
#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct InputEvent {
    tv_sec: i64,
    tv_usec: i64,
    event_type: u16,
    code: u16,
    value: i32,
}

const EV_KEY: u16 = 0x01;
const KEY_RELEASE: i32 = 0;
const KEY_REPEAT: i32 = 2;
const INPUT_EVENT_SIZE: usize = std::mem::size_of::<InputEvent>();

/// Find all keyboard input devices
fn find_keyboard_devices() -> Result<Vec<PathBuf>, EvdevError> {
    let input_dir = Path::new("/dev/input");
    if !input_dir.exists() {
        return Err(EvdevError::EnumerationFailed(
            "/dev/input does not exist".to_string(),
        ));
    }

    let keyboards: Vec<PathBuf> = fs::read_dir(input_dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with("event"))
        })
        .filter(|path| is_keyboard_device(path))
        .collect();

    if keyboards.is_empty() {
        return Err(EvdevError::NoDevices);
    }

    Ok(keyboards)
}

/// Check if a device is a keyboard by examining /sys/class/input
fn is_keyboard_device(device_path: &Path) -> bool {
    let Some(name) = device_path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    let caps_path = format!("/sys/class/input/{}/device/capabilities/key", name);
    if let Ok(caps) = fs::read_to_string(&caps_path) {
        let trimmed = caps.trim();
        if !trimmed.is_empty() && trimmed != "0" {
            // Hex bitmap of supported keys; a keyboard has well over 50
            let total_bits: u32 = trimmed
                .split_whitespace()
                .filter_map(|hex| u64::from_str_radix(hex, 16).ok())
                .map(|n| n.count_ones())
                .sum();
            return total_bits > 50;
        }
    }

    let name_path = format!("/sys/class/input/{}/device/name", name);
    match fs::read_to_string(&name_path) {
        Ok(dev_name) => {
            let dev_name = dev_name.to_lowercase();
            dev_name.contains("keyboard") || dev_name.contains("kbd")
        }
        Err(_) => false,
    }
}

/// Map a raw key value to an event type; repeats yield `None`
fn event_type_for(value: i32) -> Option<KeyEventType> {
    match value {
        KEY_RELEASE => Some(KeyEventType::Release),
        KEY_REPEAT => None,
        _ => Some(KeyEventType::Press),
    }
}

/// Evdev-based keyboard listener
pub struct EvdevListener {
    devices: Vec<File>,
    pressed_keys: HashSet<u16>,
    event_tx: mpsc::Sender<KeyEvent>,
    buffer: Vec<u8>,
}

impl EvdevListener {
    /// Open every readable keyboard device in non-blocking mode
    pub fn new(event_tx: mpsc::Sender<KeyEvent>) -> Result<Self, EvdevError> {
        let device_paths = find_keyboard_devices()?;
        let mut devices = Vec::new();

        for path in &device_paths {
            match File::open(path) {
                Ok(file) => {
                    let fd = file.as_raw_fd();
                    // SAFETY: fd is owned by `file`, which outlives both calls
                    unsafe {
                        let flags = libc::fcntl(fd, libc::F_GETFL);
                        libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
                    }
                    debug!("evdev: opened {}", path.display());
                    devices.push(file);
                }
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    warn!("evdev: permission denied for {}", path.display());
                    continue;
                }
                Err(e) => return Err(EvdevError::Io(e)),
            }
        }

        if devices.is_empty() {
            return Err(EvdevError::PermissionDenied(
                "Cannot access any keyboard devices. Try running with sudo or add user to 'input' group.".to_string(),
            ));
        }

        Ok(Self {
            devices,
            pressed_keys: HashSet::new(),
            event_tx,
            buffer: vec![0u8; INPUT_EVENT_SIZE * 64],
        })
    }

    /// Try to create an evdev listener, return None if not available
    pub fn try_new(event_tx: mpsc::Sender<KeyEvent>) -> Option<Self> {
        match Self::new(event_tx) {
            Ok(listener) => Some(listener),
            Err(e) => {
                debug!("evdev unavailable: {}", e);
                None
            }
        }
    }

    /// Get the number of connected devices
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Poll for keyboard events
    /// Returns the number of events generated
    pub fn poll(&mut self) -> usize {
        let now = Instant::now();
        let mut event_count = 0;

        for device in &mut self.devices {
            loop {
                match device.read(&mut self.buffer) {
                    Ok(bytes_read) if bytes_read >= INPUT_EVENT_SIZE => {
                        let num_events = bytes_read / INPUT_EVENT_SIZE;
                        for i in 0..num_events {
                            let offset = i * INPUT_EVENT_SIZE;
                            let event_bytes = &self.buffer[offset..offset + INPUT_EVENT_SIZE];

                            // SAFETY: slice holds exactly INPUT_EVENT_SIZE bytes
                            let input_event: InputEvent = unsafe {
                                std::ptr::read_unaligned(event_bytes.as_ptr() as *const InputEvent)
                            };

                            if input_event.event_type != EV_KEY {
                                continue;
                            }
                            let Some(event_type) = event_type_for(input_event.value) else {
                                continue;
                            };

                            let scancode = input_event.code;
                            let changed = match event_type {
                                KeyEventType::Press => self.pressed_keys.insert(scancode),
                                KeyEventType::Release => self.pressed_keys.remove(&scancode),
                            };
                            if !changed {
                                continue;
                            }

                            let event = KeyEvent::from_code(KeyCode::new(scancode), event_type, now);
                            let _ = self.event_tx.send(event);
                            event_count += 1;
                        }
                    }
                    Ok(_) => break,
                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(_) => break,
                }
            }
        }

        event_count
    }
}

/// Get a status message about evdev availability
pub fn evdev_status() -> String {
    match find_keyboard_devices() {
        Ok(devices) => format!("{} keyboard device(s) found", devices.len()),
        Err(EvdevError::NoDevices) => "No keyboard devices found".to_string(),
        Err(EvdevError::PermissionDenied(_)) => {
            "Permission denied - run with sudo or add user to 'input' group".to_string()
        }
        Err(e) => format!("Error: {}", e),
    }
}
