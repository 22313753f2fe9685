//! Resolve Type A and Type B multitouch streams into one logical touch.
//!
//! Type A devices send bare coordinate pairs (separated by SYN_MT_REPORT) and
//! signal lift-off by a report that carries no coordinates. Type B devices
//! select a slot with ABS_MT_SLOT, assign a tracking id per contact, and signal
//! lift-off with ABS_MT_TRACKING_ID == -1. Which one a panel speaks is never
//! configured; both release heuristics run on every report.
//!
//! Multiple fingers are reduced to the first contact of the session.

use super::calibration::{AxisRange, TouchCalibration};
use super::event::{
    RawEvent, ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_MT_SLOT, ABS_MT_TRACKING_ID, EV_ABS,
    EV_SYN, SYN_REPORT,
};

/// A point in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// One continuous finger contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchSession {
    pub start: Point,
    /// Where the last live scroll step was taken.
    pub last: Point,
    pub end: Point,
    pub in_swipe: bool,
}

impl TouchSession {
    fn new(at: Point) -> Self {
        Self {
            start: at,
            last: at,
            end: at,
            in_swipe: false,
        }
    }

    pub fn delta(&self) -> (i32, i32) {
        (self.end.x - self.start.x, self.end.y - self.start.y)
    }
}

/// What a completed report meant for the touch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Press,
    Move,
    Release(TouchSession),
}

/// Bookkeeping used to tell the two protocols apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchProtocolState {
    pub active_slot_count: i32,
    /// Slot the session is locked onto (Type B).
    pub first_slot: Option<i32>,
    pub current_slot: i32,
    /// Tracking id seen for the current slot in this report.
    pub tracking_id: Option<i32>,
    pub saw_x: bool,
    pub saw_y: bool,
    /// The locked slot reported tracking id -1 during this report.
    pub primary_lifted: bool,
}

impl Default for TouchProtocolState {
    fn default() -> Self {
        Self {
            active_slot_count: 0,
            first_slot: None,
            current_slot: 0,
            tracking_id: None,
            saw_x: false,
            saw_y: false,
            primary_lifted: false,
        }
    }
}

impl TouchProtocolState {
    fn is_type_a_release(&self) -> bool {
        self.active_slot_count == 0 && !self.saw_x && !self.saw_y
    }

    fn is_type_b_release(&self) -> bool {
        self.primary_lifted
    }

    /// Whether a coordinate from the current slot belongs to the locked contact.
    fn accepts_coordinate(&self) -> bool {
        if self.active_slot_count == 0 {
            !(self.saw_x && self.saw_y)
        } else {
            self.first_slot == Some(self.current_slot)
        }
    }

    fn end_report(&mut self) {
        self.saw_x = false;
        self.saw_y = false;
        self.tracking_id = None;
        self.primary_lifted = false;
    }
}

/// Latest coordinates seen, before and during a session.
#[derive(Debug, Clone, Copy, Default)]
struct PendingPoint {
    x: Option<i32>,
    y: Option<i32>,
}

pub struct TouchClassifier {
    proto: TouchProtocolState,
    pending: PendingPoint,
    session: Option<TouchSession>,
    calibration: Option<TouchCalibration>,
    fb_width: i32,
    fb_height: i32,
}

impl TouchClassifier {
    pub fn new(fb_width: i32, fb_height: i32) -> Self {
        Self {
            proto: TouchProtocolState::default(),
            pending: PendingPoint::default(),
            session: None,
            calibration: None,
            fb_width,
            fb_height,
        }
    }

    /// Install axis ranges. Only the first call has any effect.
    pub fn calibrate(&mut self, x: AxisRange, y: AxisRange) {
        if self.calibration.is_some() {
            return;
        }
        log::info!(
            "Touch calibration: x={}..{}, y={}..{} -> {}x{}",
            x.min,
            x.max,
            y.min,
            y.max,
            self.fb_width,
            self.fb_height
        );
        self.calibration = Some(TouchCalibration {
            x,
            y,
            fb_width: self.fb_width,
            fb_height: self.fb_height,
        });
    }

    pub fn protocol(&self) -> &TouchProtocolState {
        &self.proto
    }

    pub fn session(&self) -> Option<&TouchSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut TouchSession> {
        self.session.as_mut()
    }

    pub fn in_touch(&self) -> bool {
        self.session.is_some()
    }

    /// Feed one event. Returns the session phase when a report completes.
    pub fn process(&mut self, ev: &RawEvent) -> Option<TouchPhase> {
        match ev.ty {
            EV_ABS => {
                self.process_abs(ev.code, ev.value);
                None
            }
            EV_SYN if ev.code == SYN_REPORT => self.end_report(),
            _ => None,
        }
    }

    fn process_abs(&mut self, code: u16, value: i32) {
        match code {
            ABS_MT_SLOT => {
                self.proto.current_slot = value;
                self.proto.tracking_id = None;
            }
            ABS_MT_TRACKING_ID => {
                self.proto.tracking_id = Some(value);
                if value == -1 {
                    self.proto.active_slot_count = (self.proto.active_slot_count - 1).max(0);
                    if self.proto.first_slot == Some(self.proto.current_slot) {
                        self.proto.primary_lifted = true;
                    }
                } else {
                    self.proto.active_slot_count += 1;
                    if self.proto.first_slot.is_none() {
                        self.proto.first_slot = Some(self.proto.current_slot);
                    }
                }
                log::debug!(
                    "Tracking id {} on slot {}, active {}",
                    value,
                    self.proto.current_slot,
                    self.proto.active_slot_count
                );
            }
            ABS_MT_POSITION_X => {
                if !self.proto.accepts_coordinate() {
                    return;
                }
                self.proto.saw_x = true;
                let x = self.scale_x(value);
                self.pending.x = Some(x);
                if let Some(session) = self.session.as_mut() {
                    session.end.x = x;
                }
            }
            ABS_MT_POSITION_Y => {
                if !self.proto.accepts_coordinate() {
                    return;
                }
                self.proto.saw_y = true;
                let y = self.scale_y(value);
                self.pending.y = Some(y);
                if let Some(session) = self.session.as_mut() {
                    session.end.y = y;
                }
            }
            _ => {}
        }
    }

    fn end_report(&mut self) -> Option<TouchPhase> {
        let phase = match self.session {
            Some(session) => {
                if self.proto.is_type_a_release() {
                    log::debug!("Type A release at ({}, {})", session.end.x, session.end.y);
                    self.reset();
                    Some(TouchPhase::Release(session))
                } else if self.proto.is_type_b_release() {
                    log::debug!("Type B release at ({}, {})", session.end.x, session.end.y);
                    self.reset();
                    Some(TouchPhase::Release(session))
                } else {
                    Some(TouchPhase::Move)
                }
            }
            None => match (self.proto.saw_x && self.proto.saw_y, self.pending.x, self.pending.y) {
                (true, Some(x), Some(y)) => {
                    log::debug!("Press at ({}, {})", x, y);
                    self.session = Some(TouchSession::new(Point::new(x, y)));
                    Some(TouchPhase::Press)
                }
                _ => None,
            },
        };

        self.proto.end_report();
        phase
    }

    fn reset(&mut self) {
        self.session = None;
        self.pending = PendingPoint::default();
        self.proto.first_slot = None;
    }

    fn scale_x(&self, raw: i32) -> i32 {
        self.calibration.map_or(raw, |c| c.scale_x(raw))
    }

    fn scale_y(&self, raw: i32) -> i32 {
        self.calibration.map_or(raw, |c| c.scale_y(raw))
    }
}
