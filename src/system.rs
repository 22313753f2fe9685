//! Immediate actions fired from the input thread: reboot and mounting /system.

use std::process::Command;

pub trait SystemActions: Send {
    fn reboot(&mut self);
    fn mount_system(&mut self);
}

/// Runs configured shell commands. Failures are logged; nothing is retried.
pub struct CommandActions {
    reboot: String,
    mount_system: String,
}

impl CommandActions {
    pub fn new(reboot: impl Into<String>, mount_system: impl Into<String>) -> Self {
        Self {
            reboot: reboot.into(),
            mount_system: mount_system.into(),
        }
    }

    fn run(&self, what: &str, command: &str) {
        log::info!("{}: running `{}`", what, command);
        match Command::new("sh").arg("-c").arg(command).status() {
            Ok(status) if status.success() => {}
            Ok(status) => log::warn!("{} command exited with {}", what, status),
            Err(e) => log::error!("{} command failed to start: {}", what, e),
        }
    }
}

impl SystemActions for CommandActions {
    fn reboot(&mut self) {
        self.run("Reboot", &self.reboot);
    }

    fn mount_system(&mut self) {
        self.run("Mount", &self.mount_system);
    }
}
