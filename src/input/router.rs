//! Route raw events to the touch and key paths and apply what comes out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::display::Display;
use crate::policy::{HotKeyPolicy, KeyAction, RegisteredKey};
use crate::system::SystemActions;

use super::calibration::{AxisRange, SwipeThresholds};
use super::event::{
    is_digitizer_button, RawEvent, ABS_MT_SLOT, EV_ABS, EV_KEY, EV_REL, EV_SYN, KEY_DOWN,
    KEY_MAX, KEY_PRESSED, KEY_RELEASED, KEY_REPEATED, KEY_UP, REL_Y,
};
use super::gesture::{Gesture, GestureRecognizer};
use super::keys::KeyHub;
use super::queue::QueuedKey;
use super::registrar::KeyRegistrar;
use super::touch::{TouchClassifier, TouchPhase};

/// Looks up the multitouch axis ranges of a device, by device index.
pub type AxisProbe = Box<dyn FnMut(usize) -> Option<(AxisRange, AxisRange)> + Send>;

#[derive(Debug, Clone, Copy)]
pub struct RouterSettings {
    pub long_press: Duration,
    pub swipe: SwipeThresholds,
    /// Accumulated REL_Y needed for one trackball step.
    pub trackball_threshold: i32,
    /// Pause after highlighting a tapped row, so the highlight is visible.
    pub select_feedback: Duration,
}

pub struct InputRouter {
    hub: Arc<KeyHub>,
    display: Arc<dyn Display>,
    policy: Box<dyn HotKeyPolicy>,
    system: Box<dyn SystemActions>,
    registrar: KeyRegistrar,
    classifier: TouchClassifier,
    gestures: GestureRecognizer,
    probe: AxisProbe,
    touch_device: Option<usize>,
    rel_sum: i32,
    settings: RouterSettings,
}

impl InputRouter {
    pub fn new(
        hub: Arc<KeyHub>,
        display: Arc<dyn Display>,
        policy: Box<dyn HotKeyPolicy>,
        system: Box<dyn SystemActions>,
        probe: AxisProbe,
        settings: RouterSettings,
    ) -> Self {
        let classifier = TouchClassifier::new(display.screen_width(), display.screen_height());
        Self {
            registrar: KeyRegistrar::new(hub.clone(), settings.long_press),
            gestures: GestureRecognizer::new(settings.swipe),
            hub,
            display,
            policy,
            system,
            classifier,
            probe,
            touch_device: None,
            rel_sum: 0,
            settings,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.registrar.next_deadline()
    }

    /// Run long-press checks that have come due.
    pub fn on_timer(&mut self, now: Instant) {
        if let Some(code) = self.registrar.fire_due(now) {
            log::debug!("Key {} long-pressed", code);
            self.policy.key_long_press(code);
        }
    }

    pub fn handle(&mut self, ev: RawEvent, now: Instant) {
        if ev.is_touch() {
            self.handle_touch(&ev, now);
        }

        match ev.ty {
            EV_SYN => {}
            EV_REL => {
                if ev.code == REL_Y {
                    self.accumulate_trackball(ev.value, now);
                }
            }
            _ => self.rel_sum = 0,
        }

        if ev.ty == EV_KEY && ev.code <= KEY_MAX {
            if is_digitizer_button(ev.code) {
                // tracked for the policy, never registered as a key
                if ev.value != KEY_REPEATED {
                    self.hub.set_pressed(ev.code, ev.value != KEY_RELEASED);
                }
            } else {
                self.process_key(ev.code, ev.value, now);
            }
        }
    }

    fn accumulate_trackball(&mut self, value: i32, now: Instant) {
        self.rel_sum += value;
        let threshold = self.settings.trackball_threshold;
        if self.rel_sum > threshold {
            self.tap(KEY_DOWN, now);
            self.rel_sum = 0;
        } else if self.rel_sum < -threshold {
            self.tap(KEY_UP, now);
            self.rel_sum = 0;
        }
    }

    /// Only the first device that reports multitouch axes feeds the classifier.
    fn is_touchscreen(&mut self, ev: &RawEvent) -> bool {
        if let Some(device) = self.touch_device {
            return device == ev.device;
        }
        if ev.ty != EV_ABS || ev.code < ABS_MT_SLOT {
            return false;
        }

        log::info!("Using input device {} as the touchscreen", ev.device);
        self.touch_device = Some(ev.device);
        match (self.probe)(ev.device) {
            Some((x, y)) => self.classifier.calibrate(x, y),
            None => log::warn!("Touch axes unavailable, using raw coordinates"),
        }
        true
    }

    fn handle_touch(&mut self, ev: &RawEvent, now: Instant) {
        if !self.is_touchscreen(ev) {
            return;
        }

        let gesture = match self.classifier.process(ev) {
            Some(TouchPhase::Press) | Some(TouchPhase::Move) => match self.classifier.session_mut() {
                Some(session) => self.gestures.track(session, self.display.as_ref()),
                None => None,
            },
            Some(TouchPhase::Release(session)) => self.gestures.release(&session, self.display.as_ref()),
            None => None,
        };

        if let Some(gesture) = gesture {
            self.apply(gesture, now);
        }
    }

    fn apply(&mut self, gesture: Gesture, now: Instant) {
        log::debug!("Gesture {:?}", gesture);
        match gesture {
            Gesture::Tap(code) => self.tap(code, now),
            Gesture::SelectRow(row) => {
                let selected = self.display.select_menu(row);
                if !self.settings.select_feedback.is_zero() {
                    std::thread::sleep(self.settings.select_feedback);
                }
                self.enqueue(QueuedKey::MenuRow(selected));
            }
            Gesture::DismissDialog => self.display.dismiss_dialog(),
        }
    }

    fn tap(&mut self, code: u16, now: Instant) {
        self.process_key(code, KEY_PRESSED, now);
        self.process_key(code, KEY_RELEASED, now);
    }

    fn process_key(&mut self, code: u16, value: i32, now: Instant) {
        match value {
            KEY_PRESSED => self.registrar.key_down(code, now),
            KEY_RELEASED => {
                if let Some(key) = self.registrar.key_up(code) {
                    self.check_key(key);
                }
            }
            // autorepeat
            _ => {}
        }
    }

    fn check_key(&mut self, key: RegisteredKey) {
        let action = self.policy.check_key(key, &self.hub);
        log::debug!("Key {} (long={}) -> {:?}", key.code, key.long_press, action);

        match action {
            KeyAction::Ignore => {}
            KeyAction::Toggle => self.display.toggle_text(),
            KeyAction::Reboot => self.system.reboot(),
            KeyAction::Enqueue => self.enqueue(QueuedKey::Key(key.code)),
            KeyAction::MountSystem => {
                self.system.mount_system();
                self.display.print("Mounted /system.");
            }
        }
    }

    /// A showing dialog swallows the key (dismissing the dialog if allowed).
    fn enqueue(&mut self, key: QueuedKey) {
        if self.display.dialog_showing() {
            if self.display.dialog_dismissable() {
                self.display.dismiss_dialog();
            }
            return;
        }
        self.hub.push(key);
    }
}
