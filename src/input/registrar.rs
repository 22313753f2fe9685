//! Key down/up state machine with long-press detection.
//!
//! A key registers when its release directly follows its own press. Each press
//! is stamped with a new generation and schedules one long-press check; the
//! check only arms if the same press is still the last key down when it comes
//! due. Checks are polled from the dispatcher loop, so no thread is spawned per
//! key press, and a newer press always supersedes the outstanding check.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::policy::RegisteredKey;

use super::keys::KeyHub;

pub const LONG_PRESS_DELAY: Duration = Duration::from_millis(750);

/// An outstanding long-press check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingLongPress {
    pub code: u16,
    pub generation: u64,
    pub deadline: Instant,
}

pub struct KeyRegistrar {
    hub: Arc<KeyHub>,
    delay: Duration,
    pending: Option<PendingLongPress>,
}

impl KeyRegistrar {
    pub fn new(hub: Arc<KeyHub>, delay: Duration) -> Self {
        Self {
            hub,
            delay,
            pending: None,
        }
    }

    pub fn key_down(&mut self, code: u16, now: Instant) {
        let generation = self.hub.press(code);
        self.pending = Some(PendingLongPress {
            code,
            generation,
            deadline: now + self.delay,
        });
    }

    /// Returns the registered key, or None if another key was pressed in between.
    pub fn key_up(&mut self, code: u16) -> Option<RegisteredKey> {
        if self.pending.is_some_and(|p| p.code == code) {
            self.pending = None;
        }
        let registered = self
            .hub
            .release(code)
            .map(|long_press| RegisteredKey { code, long_press });
        if registered.is_none() {
            log::debug!("Key {} released out of order, not registered", code);
        }
        registered
    }

    pub fn pending(&self) -> Option<&PendingLongPress> {
        self.pending.as_ref()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    /// Run the outstanding check if it is due. Returns the key code when a
    /// long press was armed.
    pub fn fire_due(&mut self, now: Instant) -> Option<u16> {
        let pending = self.pending?;
        if now < pending.deadline {
            return None;
        }
        self.pending = None;
        self.hub
            .arm_long_press(pending.code, pending.generation)
            .then_some(pending.code)
    }
}
