//! Turn a touch session into menu navigation.
//!
//! Vertical drags scroll the menu live, one step per menu row travelled.
//! Horizontal swipes are decided on release (forward = enter, backward = back).
//! Anything else is a tap on the menu row under the finger.

use crate::display::Display;

use super::calibration::SwipeThresholds;
use super::event::{KEY_BACK, KEY_ENTER, KEY_VOLUMEDOWN, KEY_VOLUMEUP};
use super::touch::TouchSession;

pub const SCROLL_UP_KEY: u16 = KEY_VOLUMEUP;
pub const SCROLL_DOWN_KEY: u16 = KEY_VOLUMEDOWN;
pub const FORWARD_KEY: u16 = KEY_ENTER;
pub const BACKWARD_KEY: u16 = KEY_BACK;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Synthesize a press and release of this key.
    Tap(u16),
    /// Select an absolute menu row.
    SelectRow(usize),
    DismissDialog,
}

pub struct GestureRecognizer {
    thresholds: SwipeThresholds,
}

impl GestureRecognizer {
    pub fn new(thresholds: SwipeThresholds) -> Self {
        Self { thresholds }
    }

    /// Evaluate a session that is still in contact.
    pub fn track(&self, session: &mut TouchSession, display: &dyn Display) -> Option<Gesture> {
        let (dx, dy) = session.delta();

        if dx.abs() > dy.abs() {
            if dx.abs() > display.screen_width() / 4 {
                session.in_swipe = true;
            }
            return None;
        }

        let step = session.end.y - session.last.y;
        if step.abs() <= display.menu_item_height() {
            return None;
        }

        session.in_swipe = true;
        if display.dialog_showing() {
            return None;
        }
        session.last = session.end;
        let key = if step < 0 { SCROLL_UP_KEY } else { SCROLL_DOWN_KEY };
        log::debug!("Live scroll {} (step {}px)", if step < 0 { "up" } else { "down" }, step);
        Some(Gesture::Tap(key))
    }

    /// Evaluate a session that just ended.
    pub fn release(&self, session: &TouchSession, display: &dyn Display) -> Option<Gesture> {
        if display.dialog_showing() {
            if display.dialog_dismissable() && !session.in_swipe {
                return Some(Gesture::DismissDialog);
            }
            return None;
        }

        let (dx, dy) = session.delta();

        if session.in_swipe {
            // vertical swipes were already handled while tracking
            if dx.abs() > dy.abs() && dx.abs() > self.thresholds.min_x_px {
                return Some(Gesture::Tap(if dx > 0 { FORWARD_KEY } else { BACKWARD_KEY }));
            }
            return None;
        }

        let height = display.menu_item_height();
        let offset = session.end.y - display.menu_item_top();
        if height <= 0 || offset < 0 {
            log::debug!("Tap at y={} is outside the menu", session.end.y);
            return None;
        }
        Some(Gesture::SelectRow((offset / height) as usize))
    }
}
