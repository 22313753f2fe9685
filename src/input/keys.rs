//! Key state and the key queue, shared between the input thread and the
//! foreground consumer behind one mutex and one condition variable.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::event::KEY_CNT;
use super::queue::{KeyQueue, QueuedKey};

/// How long `wait_key` blocks before giving up.
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub tick: Duration,
    pub timeout_ticks: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            timeout_ticks: 120,
        }
    }
}

/// Result of one `wait_key` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Key(u16),
    MenuRow(usize),
    /// The wait was cancelled through `cancel_wait_key`.
    Cancelled,
    TimedOut,
    /// Volumes changed while waiting; the caller should redraw.
    Refresh,
}

/// Pressed state of every key plus the bookkeeping the registrar needs.
struct KeyState {
    pressed: [bool; KEY_CNT],
    last_down: Option<u16>,
    long_press: bool,
    generation: u64,
    volumes_changed: bool,
    queue: KeyQueue,
}

pub type CableProbe = Box<dyn Fn() -> bool + Send + Sync>;

pub struct KeyHub {
    state: Mutex<KeyState>,
    cond: Condvar,
    wait: WaitPolicy,
    cable_connected: CableProbe,
}

impl KeyHub {
    pub fn new(wait: WaitPolicy, cable_connected: CableProbe) -> Self {
        Self {
            state: Mutex::new(KeyState {
                pressed: [false; KEY_CNT],
                last_down: None,
                long_press: false,
                generation: 0,
                volumes_changed: false,
                queue: KeyQueue::new(),
            }),
            cond: Condvar::new(),
            wait,
            cable_connected,
        }
    }

    fn lock(&self) -> MutexGuard<'_, KeyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a key-down. Returns the generation stamped on this press.
    pub fn press(&self, code: u16) -> u64 {
        let mut state = self.lock();
        if let Some(p) = state.pressed.get_mut(code as usize) {
            *p = true;
        }
        state.generation += 1;
        state.last_down = Some(code);
        state.long_press = false;
        state.generation
    }

    /// Record a key-up. Returns `Some(long_press)` when the key registers,
    /// i.e. it was the most recent key pressed down.
    pub fn release(&self, code: u16) -> Option<bool> {
        let mut state = self.lock();
        if let Some(p) = state.pressed.get_mut(code as usize) {
            *p = false;
        }
        let registered = (state.last_down == Some(code)).then_some(state.long_press);
        state.last_down = None;
        registered
    }

    /// Mark the press stamped `generation` as long, if it is still held and
    /// no newer press happened. Returns whether it was armed.
    pub fn arm_long_press(&self, code: u16, generation: u64) -> bool {
        let mut state = self.lock();
        if state.last_down == Some(code) && state.generation == generation {
            state.long_press = true;
            return true;
        }
        false
    }

    /// Update the pressed bitmap only, without touching registration state.
    pub fn set_pressed(&self, code: u16, pressed: bool) {
        if let Some(p) = self.lock().pressed.get_mut(code as usize) {
            *p = pressed;
        }
    }

    pub fn is_key_pressed(&self, code: u16) -> bool {
        self.lock().pressed.get(code as usize).copied().unwrap_or(false)
    }

    /// Append a key for the foreground loop. Returns false if the queue was full.
    pub fn push(&self, key: QueuedKey) -> bool {
        let mut state = self.lock();
        if !state.queue.push(key) {
            log::debug!("Key queue full, dropping {:?}", key);
            return false;
        }
        self.cond.notify_one();
        true
    }

    /// Wake one pending `wait_key` with a cancel marker. Queued keys keep their order.
    pub fn cancel_wait_key(&self) {
        self.push(QueuedKey::Cancel);
    }

    pub fn flush_keys(&self) {
        self.lock().queue.clear();
    }

    pub fn notify_volumes_changed(&self) {
        let mut state = self.lock();
        state.volumes_changed = true;
        self.cond.notify_one();
    }

    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    /// Block until a key is queued, the wait times out, or volumes change.
    ///
    /// The wait proceeds in ticks; after every wake-up the volumes-changed flag
    /// is consumed and preempts the wait. While the cable probe reports a
    /// connection the timeout never expires.
    pub fn wait_key(&self) -> WaitOutcome {
        let mut state = self.lock();
        let mut ticks_left = self.wait.timeout_ticks;

        while state.queue.is_empty() {
            let deadline = Instant::now() + self.wait.tick;

            loop {
                let now = Instant::now();
                if !state.queue.is_empty() || now >= deadline {
                    break;
                }
                let (guard, _) = self
                    .cond
                    .wait_timeout(state, deadline - now)
                    .unwrap_or_else(PoisonError::into_inner);
                state = guard;

                if std::mem::take(&mut state.volumes_changed) {
                    return WaitOutcome::Refresh;
                }
            }

            if !state.queue.is_empty() {
                break;
            }
            ticks_left = ticks_left.saturating_sub(1);
            if ticks_left == 0 && !(self.cable_connected)() {
                break;
            }
        }

        match state.queue.pop() {
            Some(QueuedKey::Key(code)) => WaitOutcome::Key(code),
            Some(QueuedKey::MenuRow(row)) => WaitOutcome::MenuRow(row),
            Some(QueuedKey::Cancel) => WaitOutcome::Cancelled,
            None => WaitOutcome::TimedOut,
        }
    }
}
