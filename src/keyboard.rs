// src/keyboard.rs
use anyhow::{anyhow, Result};

use crate::drivers::Actuator;

/// Windows virtual-key code for a key name such as `space`, `w` or `up`.
pub fn virtual_key_code(name: &str) -> Option<u16> {
    let lower = name.trim().to_ascii_lowercase();
    let code = match lower.as_str() {
        "space" => 0x20,
        "enter" | "return" => 0x0D,
        "shift" => 0x10,
        "ctrl" | "control" => 0x11,
        "left" => 0x25,
        "up" => 0x26,
        "right" => 0x27,
        "down" => 0x28,
        single if single.len() == 1 => {
            let c = single.chars().next()?;
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase() as u16
            } else {
                return None;
            }
        }
        _ => return None,
    };
    Some(code)
}

/// Holds a keyboard key down while engaged (e.g. `space` to walk in game).
pub struct KeyPressActuator {
    key: String,
    vk: u16,
    held: bool,
}

impl KeyPressActuator {
    pub fn new(key: &str) -> Result<Self> {
        let vk = virtual_key_code(key).ok_or_else(|| anyhow!("unknown key name {key:?}"))?;
        if !cfg!(windows) {
            return Err(anyhow!("key injection is only available on Windows"));
        }
        Ok(Self {
            key: key.to_owned(),
            vk,
            held: false,
        })
    }
}

impl Actuator for KeyPressActuator {
    fn engage(&mut self) {
        if self.held {
            return;
        }
        match send_key(self.vk, true) {
            Ok(()) => {
                self.held = true;
                log::info!("🚶 Walking Activated ({} down)", self.key);
            }
            Err(e) => log::warn!("failed to press {}: {e}", self.key),
        }
    }

    fn release(&mut self) {
        if !self.held {
            return;
        }
        match send_key(self.vk, false) {
            Ok(()) => {
                self.held = false;
                log::info!("🛑 Walking Stopped ({} up)", self.key);
            }
            Err(e) => log::warn!("failed to release {}: {e}", self.key),
        }
    }
}

impl Drop for KeyPressActuator {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(windows)]
fn send_key(vk: u16, down: bool) -> Result<()> {
    use winapi::um::winuser::{SendInput, INPUT, INPUT_KEYBOARD, KEYBDINPUT, KEYEVENTF_KEYUP};
    unsafe {
        let mut input: INPUT = std::mem::zeroed();
        input.type_ = INPUT_KEYBOARD;
        *input.u.ki_mut() = KEYBDINPUT {
            wVk: vk,
            wScan: 0,
            dwFlags: if down { 0 } else { KEYEVENTF_KEYUP },
            time: 0,
            dwExtraInfo: 0,
        };
        if SendInput(1, &mut input, std::mem::size_of::<INPUT>() as i32) != 1 {
            return Err(anyhow!("SendInput rejected the key event"));
        }
    }
    Ok(())
}

#[cfg(not(windows))]
fn send_key(_vk: u16, _down: bool) -> Result<()> {
    Err(anyhow!("key injection is only available on Windows"))
}

/// Actuator that only logs, for dry runs and non-Windows hosts.
#[derive(Debug, Default)]
pub struct LogActuator {
    engaged: bool,
}

impl Actuator for LogActuator {
    fn engage(&mut self) {
        if !self.engaged {
            self.engaged = true;
            log::info!("🚶 Walking Activated (dry run)");
        }
    }

    fn release(&mut self) {
        if self.engaged {
            self.engaged = false;
            log::info!("🛑 Walking Stopped (dry run)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_map_to_virtual_keys() {
        assert_eq!(virtual_key_code("space"), Some(0x20));
        assert_eq!(virtual_key_code("W"), Some(0x57));
        assert_eq!(virtual_key_code("w"), Some(0x57));
        assert_eq!(virtual_key_code("7"), Some(0x37));
        assert_eq!(virtual_key_code(" Up "), Some(0x26));
        assert_eq!(virtual_key_code("f13"), None);
        assert_eq!(virtual_key_code("?"), None);
        assert_eq!(virtual_key_code(""), None);
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(KeyPressActuator::new("not-a-key").is_err());
    }

    #[cfg(not(windows))]
    #[test]
    fn key_injection_needs_windows() {
        assert!(KeyPressActuator::new("space").is_err());
    }

    #[test]
    fn log_actuator_is_idempotent() {
        let mut actuator = LogActuator::default();
        actuator.engage();
        actuator.engage();
        assert!(actuator.engaged);
        actuator.release();
        actuator.release();
        assert!(!actuator.engaged);
    }
}
