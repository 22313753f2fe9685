//! The input thread: one `poll(2)` over every input device and the control
//! socket, feeding the router one event per ready descriptor.

use std::io;
use std::os::unix::io::AsRawFd;
use std::os::unix::net::UnixListener;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::control::{ClientRead, ControlClient, ControlCommand};
use crate::device::InputDevice;
use crate::display::Display;

use super::router::InputRouter;

const POLL_RETRY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
enum Source {
    Device(usize),
    Listener,
    Client(usize),
}

pub struct Dispatcher {
    /// Indexed by device id; a removed device leaves a hole so ids stay stable.
    devices: Vec<Option<InputDevice>>,
    listener: Option<UnixListener>,
    clients: Vec<ControlClient>,
    router: InputRouter,
    display: Arc<dyn Display>,
}

impl Dispatcher {
    pub fn new(
        devices: Vec<InputDevice>,
        listener: Option<UnixListener>,
        router: InputRouter,
        display: Arc<dyn Display>,
    ) -> Self {
        Self {
            devices: devices.into_iter().map(Some).collect(),
            listener,
            clients: Vec::new(),
            router,
            display,
        }
    }

    /// Run forever. Poll failures are logged and retried.
    pub fn run(mut self) {
        log::info!(
            "Input thread started ({} devices, control socket {})",
            self.devices.len(),
            if self.listener.is_some() { "on" } else { "off" }
        );

        loop {
            if let Err(e) = self.poll_once() {
                log::error!("poll failed: {}", e);
                thread::sleep(POLL_RETRY);
            }
        }
    }

    fn poll_once(&mut self) -> io::Result<()> {
        let (mut fds, sources) = self.poll_set();
        let timeout = poll_timeout(self.router.next_deadline(), Instant::now());

        let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err);
        }

        let now = Instant::now();
        let mut closed = Vec::new();
        for (pfd, source) in fds.iter().zip(sources) {
            if pfd.revents == 0 {
                continue;
            }
            match source {
                Source::Device(index) => self.service_device(index, pfd.revents, now),
                Source::Listener => self.accept_clients(),
                Source::Client(index) => {
                    if !self.service_client(index, pfd.revents) {
                        closed.push(index);
                    }
                }
            }
        }

        for index in closed.into_iter().rev() {
            self.clients.remove(index);
        }

        self.router.on_timer(Instant::now());
        Ok(())
    }

    fn poll_set(&self) -> (Vec<libc::pollfd>, Vec<Source>) {
        let mut fds = Vec::new();
        let mut sources = Vec::new();

        for (index, device) in self.devices.iter().enumerate() {
            if let Some(device) = device {
                fds.push(pollfd(device.as_raw_fd()));
                sources.push(Source::Device(index));
            }
        }
        if let Some(listener) = &self.listener {
            fds.push(pollfd(listener.as_raw_fd()));
            sources.push(Source::Listener);
        }
        for (index, client) in self.clients.iter().enumerate() {
            fds.push(pollfd(client.stream().as_raw_fd()));
            sources.push(Source::Client(index));
        }

        (fds, sources)
    }

    fn service_device(&mut self, index: usize, revents: libc::c_short, now: Instant) {
        let Some(device) = self.devices[index].as_mut() else {
            return;
        };

        if revents & libc::POLLIN == 0 {
            log::warn!("Input device {} hung up, removing it", device.path().display());
            self.devices[index] = None;
            return;
        }

        match device.read_event(index) {
            Ok(Some(ev)) => self.router.handle(ev, now),
            Ok(None) => {}
            Err(e) if e.raw_os_error() == Some(libc::ENODEV) => {
                log::warn!("Input device {} is gone, removing it", device.path().display());
                self.devices[index] = None;
            }
            Err(e) => log::warn!("Dropped event from {}: {}", device.path().display(), e),
        }
    }

    fn accept_clients(&mut self) {
        let Some(listener) = &self.listener else {
            return;
        };
        loop {
            match listener.accept() {
                Ok((stream, _)) => {
                    log::debug!("Control client connected");
                    self.clients.push(ControlClient::new(stream));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    log::warn!("Control accept failed: {}", e);
                    break;
                }
            }
        }
    }

    /// Returns false once the client is gone.
    fn service_client(&mut self, index: usize, revents: libc::c_short) -> bool {
        let read = if revents & libc::POLLIN != 0 {
            self.clients[index].read_commands()
        } else {
            Ok(ClientRead::Closed)
        };

        match read {
            Ok(ClientRead::Commands(commands)) => {
                for command in commands {
                    log::debug!("Control command {:?}", command);
                    match command {
                        ControlCommand::ShowDialog(text) => self.display.show_dialog(&text),
                        ControlCommand::DismissDialog => self.display.dismiss_dialog(),
                    }
                }
                true
            }
            Ok(ClientRead::Closed) => {
                log::debug!("Control client disconnected");
                self.display.dismiss_dialog();
                false
            }
            Err(e) => {
                log::warn!("Control client read failed: {}", e);
                self.display.dismiss_dialog();
                false
            }
        }
    }
}

fn pollfd(fd: libc::c_int) -> libc::pollfd {
    libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    }
}

/// Milliseconds until `deadline` (rounded up), or -1 to block indefinitely.
fn poll_timeout(deadline: Option<Instant>, now: Instant) -> libc::c_int {
    let Some(deadline) = deadline else {
        return -1;
    };
    let wait = deadline.saturating_duration_since(now);
    let millis = wait.as_micros().div_ceil(1000);
    millis.min(libc::c_int::MAX as u128) as libc::c_int
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::display::{HeadlessDisplay, MenuGeometry};
    use crate::input::calibration::SwipeThresholds;
    use crate::input::event::{RawEvent, EV_KEY, KEY_POWER, KEY_PRESSED};
    use crate::input::keys::{KeyHub, WaitPolicy};
    use crate::input::router::RouterSettings;
    use crate::policy::{HotKeyPolicy, KeyAction, RegisteredKey};
    use crate::system::SystemActions;

    struct LongPresses(Arc<Mutex<Vec<u16>>>);

    impl HotKeyPolicy for LongPresses {
        fn check_key(&mut self, _key: RegisteredKey, _keys: &KeyHub) -> KeyAction {
            KeyAction::Enqueue
        }

        fn key_long_press(&mut self, code: u16) {
            self.0.lock().unwrap().push(code);
        }
    }

    struct NoActions;

    impl SystemActions for NoActions {
        fn reboot(&mut self) {}
        fn mount_system(&mut self) {}
    }

    fn dispatcher(long_press: Duration, log: Arc<Mutex<Vec<u16>>>) -> Dispatcher {
        let hub = Arc::new(KeyHub::new(WaitPolicy::default(), Box::new(|| false)));
        let display: Arc<dyn Display> = Arc::new(HeadlessDisplay::new(MenuGeometry {
            screen_width: 480,
            screen_height: 800,
            item_top: 100,
            item_height: 60,
            item_count: 6,
        }));
        let router = InputRouter::new(
            hub,
            display.clone(),
            Box::new(LongPresses(log)),
            Box::new(NoActions),
            Box::new(|_| None),
            RouterSettings {
                long_press,
                swipe: SwipeThresholds { min_x_px: 80, min_y_px: 48 },
                trackball_threshold: 3,
                select_feedback: Duration::ZERO,
            },
        );
        Dispatcher::new(Vec::new(), None, router, display)
    }

    #[test]
    fn test_poll_timeout_fires_long_press() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut d = dispatcher(Duration::from_millis(20), log.clone());
        let start = Instant::now();
        d.router.handle(
            RawEvent { device: 0, ty: EV_KEY, code: KEY_POWER, value: KEY_PRESSED },
            start,
        );
        assert!(d.router.next_deadline().is_some());

        // nothing to poll: the call returns when the long-press deadline passes
        d.poll_once().unwrap();

        assert!(start.elapsed() >= Duration::from_millis(20));
        assert_eq!(*log.lock().unwrap(), vec![KEY_POWER]);
        assert!(d.router.next_deadline().is_none());
    }

    #[test]
    fn test_poll_timeout_blocks_without_deadline() {
        assert_eq!(poll_timeout(None, Instant::now()), -1);
    }

    #[test]
    fn test_poll_timeout_rounds_up() {
        let now = Instant::now();
        assert_eq!(poll_timeout(Some(now + Duration::from_micros(1500)), now), 2);
        assert_eq!(poll_timeout(Some(now + Duration::from_millis(750)), now), 750);
    }

    #[test]
    fn test_poll_timeout_past_deadline() {
        let now = Instant::now();
        assert_eq!(poll_timeout(Some(now), now + Duration::from_secs(1)), 0);
    }
}
