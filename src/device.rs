//! Local input devices and the USB cable probe.

use std::fs::File;
use std::io::{self, Read};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use crate::input::event::{parse_input_event, RawEvent, INPUT_EVENT_SIZE};

/// An opened `/dev/input/eventN` node.
pub struct InputDevice {
    path: PathBuf,
    file: File,
}

impl InputDevice {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read exactly one event. Returns None for a record that does not parse.
    pub fn read_event(&mut self, index: usize) -> io::Result<Option<RawEvent>> {
        let mut buf = [0u8; INPUT_EVENT_SIZE];
        self.file.read_exact(&mut buf)?;
        Ok(parse_input_event(&buf).map(|ev| RawEvent::new(index, &ev)))
    }
}

impl AsRawFd for InputDevice {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

/// Open every `event*` node under `dir`, in name order. Nodes that cannot be
/// opened are skipped with a warning.
pub fn open_input_devices(dir: &Path) -> io::Result<Vec<InputDevice>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("event"))
        })
        .collect();
    paths.sort();

    let mut devices = Vec::with_capacity(paths.len());
    for path in paths {
        match InputDevice::open(&path) {
            Ok(device) => {
                log::info!("Opened input device {}", path.display());
                devices.push(device);
            }
            Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
        }
    }
    Ok(devices)
}

/// USB is connected when the gadget state file reads CONNECTED or CONFIGURED.
pub fn usb_connected(state_path: &Path) -> bool {
    let mut file = match File::open(state_path) {
        Ok(file) => file,
        Err(e) => {
            log::debug!("Failed to open {}: {}", state_path.display(), e);
            return false;
        }
    };
    let mut first = [0u8; 1];
    matches!(file.read(&mut first), Ok(1) if first[0] == b'C')
}
