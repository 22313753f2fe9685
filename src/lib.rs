//! Input core for a recovery console: multitouch and hardware keys in, a
//! bounded queue of logical keys out.
//!
//! [`RecoveryInput::init`] opens every input node, binds the control socket
//! and starts the `input` thread. The foreground then calls
//! [`RecoveryInput::wait_key`] to receive keys, menu selections, cancellation
//! or a timeout.

pub mod config;
pub mod control;
pub mod device;
pub mod display;
pub mod input;
pub mod policy;
pub mod system;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use config::Config;
use display::Display;
use input::calibration::probe_touch_axes;
use input::router::AxisProbe;
use input::{Dispatcher, InputRouter, KeyHub, WaitOutcome};
use policy::HotKeyPolicy;
use system::SystemActions;

pub struct RecoveryInput {
    hub: Arc<KeyHub>,
    _thread: JoinHandle<()>,
}

impl RecoveryInput {
    /// Open devices and start the input thread.
    pub fn init(
        config: &Config,
        display: Arc<dyn Display>,
        policy: Box<dyn HotKeyPolicy>,
        system: Box<dyn SystemActions>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let usb_state = config.usb_state_path.clone();
        let hub = Arc::new(KeyHub::new(
            config.wait_policy(),
            Box::new(move || device::usb_connected(&usb_state)),
        ));

        let devices = device::open_input_devices(&config.input_dir)?;
        if devices.is_empty() {
            log::warn!("No input devices under {}", config.input_dir.display());
        }

        let paths: Vec<PathBuf> = devices.iter().map(|d| d.path().to_path_buf()).collect();
        let probe: AxisProbe = Box::new(move |index| {
            let path = paths.get(index)?;
            match probe_touch_axes(path) {
                Ok(axes) => Some(axes),
                Err(e) => {
                    log::warn!("Failed to read touch axes of {}: {}", path.display(), e);
                    None
                }
            }
        });

        let listener = match &config.control_socket {
            Some(path) => match control::bind(path) {
                Ok(listener) => Some(listener),
                Err(e) => {
                    log::warn!("Control socket {} unavailable: {}", path.display(), e);
                    None
                }
            },
            None => None,
        };

        let router = InputRouter::new(
            hub.clone(),
            display.clone(),
            policy,
            system,
            probe,
            config.router_settings(),
        );
        let dispatcher = Dispatcher::new(devices, listener, router, display);
        let thread = thread::Builder::new()
            .name("input".into())
            .spawn(move || dispatcher.run())?;

        Ok(Self {
            hub,
            _thread: thread,
        })
    }

    /// Block until a key, menu row, cancellation, refresh or timeout.
    pub fn wait_key(&self) -> WaitOutcome {
        self.hub.wait_key()
    }

    /// Wake a blocked `wait_key` with [`WaitOutcome::Cancelled`]. Callable
    /// from any thread.
    pub fn cancel_wait_key(&self) {
        self.hub.cancel_wait_key();
    }

    pub fn flush_keys(&self) {
        self.hub.flush_keys();
    }

    pub fn is_key_pressed(&self, code: u16) -> bool {
        self.hub.is_key_pressed(code)
    }

    pub fn notify_volumes_changed(&self) {
        self.hub.notify_volumes_changed();
    }

    /// Shared handle for threads that need to cancel or inspect keys.
    pub fn hub(&self) -> Arc<KeyHub> {
        self.hub.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use display::{HeadlessDisplay, MenuGeometry};
    use policy::DefaultPolicy;
    use system::CommandActions;

    fn start(dir_name: &str) -> (RecoveryInput, PathBuf) {
        let dir = std::env::temp_dir().join(format!("recovery-input-{}-{}", dir_name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let config = Config {
            input_dir: dir.clone(),
            control_socket: None,
            usb_state_path: dir.join("usb-state"),
            ..Config::default()
        };
        let display = Arc::new(HeadlessDisplay::new(MenuGeometry {
            screen_width: 480,
            screen_height: 800,
            item_top: 100,
            item_height: 60,
            item_count: 6,
        }));
        let input = RecoveryInput::init(
            &config,
            display,
            Box::new(DefaultPolicy::new()),
            Box::new(CommandActions::new("true", "true")),
        )
        .unwrap();
        (input, dir)
    }

    #[test]
    fn test_cancel_from_other_thread() {
        let (input, dir) = start("facade-cancel");
        let hub = input.hub();
        let canceller = thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(50));
            hub.cancel_wait_key();
        });
        assert_eq!(input.wait_key(), WaitOutcome::Cancelled);
        canceller.join().unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_flush_drops_cancel() {
        let (input, dir) = start("facade-flush");
        input.cancel_wait_key();
        input.flush_keys();
        assert_eq!(input.hub().queued(), 0);
        assert!(!input.is_key_pressed(input::event::KEY_POWER));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_input_dir_fails() {
        let config = Config {
            input_dir: PathBuf::from("/nonexistent/input"),
            control_socket: None,
            ..Config::default()
        };
        let display = Arc::new(HeadlessDisplay::new(MenuGeometry {
            screen_width: 480,
            screen_height: 800,
            item_top: 100,
            item_height: 60,
            item_count: 6,
        }));
        let result = RecoveryInput::init(
            &config,
            display,
            Box::new(DefaultPolicy::new()),
            Box::new(CommandActions::new("true", "true")),
        );
        assert!(result.is_err());
    }
}
