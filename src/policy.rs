//! Hot-key policy: what a registered key does.
//!
//! The table is device specific. `DefaultPolicy` assumes power, volume-up and
//! volume-down keys:
//!
//! - hold power and press volume-up to toggle the text log
//! - press power seven times in a row to reboot
//! - alternate volume-up and volume-down seven times to mount /system

use crate::input::event::{KEY_POWER, KEY_VOLUMEDOWN, KEY_VOLUMEUP};
use crate::input::keys::KeyHub;

const REPEAT_TRIGGER: u32 = 7;

/// What to do with a registered key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Ignore,
    /// Toggle the on-screen text log.
    Toggle,
    /// Reboot immediately, from the input thread.
    Reboot,
    /// Hand the key to the foreground loop.
    Enqueue,
    /// Mount /system immediately, from the input thread.
    MountSystem,
}

/// A key whose down/up pair was observed with no other key in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisteredKey {
    pub code: u16,
    pub long_press: bool,
}

pub trait HotKeyPolicy: Send {
    /// Classify a registered key. `keys` answers which other keys are held.
    fn check_key(&mut self, key: RegisteredKey, keys: &KeyHub) -> KeyAction;

    /// A key has been held long enough to count as a long press (it is still down).
    fn key_long_press(&mut self, _code: u16) {}
}

#[derive(Debug, Default)]
pub struct DefaultPolicy {
    consecutive_power_keys: u32,
    consecutive_alternate_keys: u32,
    last_key: Option<u16>,
}

impl DefaultPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_alternating(&self, code: u16) -> bool {
        match code {
            KEY_VOLUMEUP => matches!(self.last_key, None | Some(KEY_VOLUMEDOWN)),
            KEY_VOLUMEDOWN => matches!(self.last_key, None | Some(KEY_VOLUMEUP)),
            _ => false,
        }
    }
}

impl HotKeyPolicy for DefaultPolicy {
    fn check_key(&mut self, key: RegisteredKey, keys: &KeyHub) -> KeyAction {
        let code = key.code;

        if keys.is_key_pressed(KEY_POWER) && code == KEY_VOLUMEUP {
            return KeyAction::Toggle;
        }

        if code == KEY_POWER {
            self.consecutive_power_keys += 1;
            if self.consecutive_power_keys >= REPEAT_TRIGGER {
                return KeyAction::Reboot;
            }
        } else {
            self.consecutive_power_keys = 0;
        }

        if self.is_alternating(code) {
            self.consecutive_alternate_keys += 1;
            if self.consecutive_alternate_keys >= REPEAT_TRIGGER {
                self.consecutive_alternate_keys = 0;
                return KeyAction::MountSystem;
            }
        } else {
            self.consecutive_alternate_keys = 0;
        }
        self.last_key = Some(code);

        KeyAction::Enqueue
    }

    fn key_long_press(&mut self, code: u16) {
        log::debug!("Long press on key {}", code);
    }
}
