//! The screen as seen by the input core.
//!
//! Rendering lives elsewhere; the core only queries menu geometry and drives
//! the modal dialog. `HeadlessDisplay` keeps the state in memory and logs it,
//! which is enough for running the core without a framebuffer.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub trait Display: Send + Sync {
    fn dialog_showing(&self) -> bool;
    fn dialog_dismissable(&self) -> bool;
    fn dismiss_dialog(&self);
    fn show_dialog(&self, text: &str);

    /// Y coordinate of the first menu row, in pixels.
    fn menu_item_top(&self) -> i32;
    fn menu_item_height(&self) -> i32;
    fn screen_width(&self) -> i32;
    fn screen_height(&self) -> i32;

    /// Highlight `row` and return the row actually selected.
    fn select_menu(&self, row: usize) -> usize;

    /// Toggle the on-screen text log.
    fn toggle_text(&self);
    fn print(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuGeometry {
    pub screen_width: i32,
    pub screen_height: i32,
    pub item_top: i32,
    pub item_height: i32,
    pub item_count: usize,
}

#[derive(Debug, Default)]
struct HeadlessState {
    dialog: Option<String>,
    text_visible: bool,
    selection: usize,
}

pub struct HeadlessDisplay {
    geometry: MenuGeometry,
    state: Mutex<HeadlessState>,
}

impl HeadlessDisplay {
    pub fn new(geometry: MenuGeometry) -> Self {
        Self {
            geometry,
            state: Mutex::new(HeadlessState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn dialog_text(&self) -> Option<String> {
        self.lock().dialog.clone()
    }

    pub fn selection(&self) -> usize {
        self.lock().selection
    }

    pub fn text_visible(&self) -> bool {
        self.lock().text_visible
    }
}

impl Display for HeadlessDisplay {
    fn dialog_showing(&self) -> bool {
        self.lock().dialog.is_some()
    }

    fn dialog_dismissable(&self) -> bool {
        true
    }

    fn dismiss_dialog(&self) {
        if self.lock().dialog.take().is_some() {
            log::info!("Dialog dismissed");
        }
    }

    fn show_dialog(&self, text: &str) {
        log::info!("Dialog: {}", text);
        self.lock().dialog = Some(text.to_string());
    }

    fn menu_item_top(&self) -> i32 {
        self.geometry.item_top
    }

    fn menu_item_height(&self) -> i32 {
        self.geometry.item_height
    }

    fn screen_width(&self) -> i32 {
        self.geometry.screen_width
    }

    fn screen_height(&self) -> i32 {
        self.geometry.screen_height
    }

    fn select_menu(&self, row: usize) -> usize {
        let capped = row.min(self.geometry.item_count.saturating_sub(1));
        self.lock().selection = capped;
        log::debug!("Menu selection {}", capped);
        capped
    }

    fn toggle_text(&self) {
        let mut state = self.lock();
        state.text_visible = !state.text_visible;
        log::info!("Text log {}", if state.text_visible { "shown" } else { "hidden" });
    }

    fn print(&self, message: &str) {
        log::info!("{}", message);
    }
}
