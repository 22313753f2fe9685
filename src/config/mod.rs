mod cli;
mod file;

pub use cli::{Cli, Command};

use std::path::PathBuf;
use std::time::Duration;

use crate::display::MenuGeometry;
use crate::input::calibration::SwipeThresholds;
use crate::input::registrar::LONG_PRESS_DELAY;
use crate::input::{RouterSettings, WaitPolicy};

const DEFAULT_INPUT_DIR: &str = "/dev/input";
const DEFAULT_CONTROL_SOCKET: &str = "/tmp/recovery-ui.sock";
const DEFAULT_USB_STATE: &str = "/sys/class/android_usb/android0/state";
const DEFAULT_LCD_DENSITY: i32 = 160;
const DEFAULT_SCREEN_WIDTH: i32 = 480;
const DEFAULT_SCREEN_HEIGHT: i32 = 800;
const DEFAULT_MENU_ITEM_TOP: i32 = 100;
const DEFAULT_MENU_ITEM_HEIGHT: i32 = 60;
const DEFAULT_MENU_ITEM_COUNT: usize = 6;
const DEFAULT_WAIT_TIMEOUT_SECS: u32 = 120;
const DEFAULT_TRACKBALL_THRESHOLD: i32 = 3;
const SELECT_FEEDBACK: Duration = Duration::from_millis(50);

/// Merged configuration from CLI args and TOML file.
#[derive(Debug, Clone)]
pub struct Config {
    pub input_dir: PathBuf,
    /// None when the control socket is disabled.
    pub control_socket: Option<PathBuf>,
    pub lcd_density: i32,
    pub screen_width: i32,
    pub screen_height: i32,
    pub menu_item_top: i32,
    pub menu_item_height: i32,
    pub menu_item_count: usize,
    pub wait_timeout_secs: u32,
    pub long_press_ms: u64,
    pub usb_state_path: PathBuf,
    pub trackball_threshold: i32,
    pub reboot_command: String,
    pub mount_command: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: DEFAULT_INPUT_DIR.into(),
            control_socket: Some(DEFAULT_CONTROL_SOCKET.into()),
            lcd_density: DEFAULT_LCD_DENSITY,
            screen_width: DEFAULT_SCREEN_WIDTH,
            screen_height: DEFAULT_SCREEN_HEIGHT,
            menu_item_top: DEFAULT_MENU_ITEM_TOP,
            menu_item_height: DEFAULT_MENU_ITEM_HEIGHT,
            menu_item_count: DEFAULT_MENU_ITEM_COUNT,
            wait_timeout_secs: DEFAULT_WAIT_TIMEOUT_SECS,
            long_press_ms: LONG_PRESS_DELAY.as_millis() as u64,
            usb_state_path: DEFAULT_USB_STATE.into(),
            trackball_threshold: DEFAULT_TRACKBALL_THRESHOLD,
            reboot_command: "reboot".into(),
            mount_command: "mount /system".into(),
        }
    }
}

impl Config {
    /// Load configuration by merging TOML file with CLI overrides.
    pub fn load(cli: &Cli) -> Self {
        let file_config = cli
            .config
            .as_ref()
            .and_then(|p| file::load_from_path(p))
            .or_else(file::load_from_default_paths)
            .unwrap_or_default();

        Self::merge(cli, file_config)
    }

    fn merge(cli: &Cli, file: file::FileConfig) -> Self {
        let defaults = Self::default();
        let control_socket = if cli.no_control || file.no_control {
            None
        } else {
            cli.control_socket
                .clone()
                .or(file.control_socket)
                .or(defaults.control_socket)
        };

        Self {
            input_dir: cli
                .input_dir
                .clone()
                .or(file.input_dir)
                .unwrap_or(defaults.input_dir),
            control_socket,
            lcd_density: cli.lcd_density.or(file.lcd_density).unwrap_or(defaults.lcd_density),
            screen_width: cli.screen_width.or(file.screen_width).unwrap_or(defaults.screen_width),
            screen_height: cli
                .screen_height
                .or(file.screen_height)
                .unwrap_or(defaults.screen_height),
            menu_item_top: cli
                .menu_item_top
                .or(file.menu_item_top)
                .unwrap_or(defaults.menu_item_top),
            menu_item_height: cli
                .menu_item_height
                .or(file.menu_item_height)
                .unwrap_or(defaults.menu_item_height),
            menu_item_count: cli
                .menu_item_count
                .or(file.menu_item_count)
                .unwrap_or(defaults.menu_item_count),
            wait_timeout_secs: cli
                .wait_timeout_secs
                .or(file.wait_timeout_secs)
                .unwrap_or(defaults.wait_timeout_secs),
            long_press_ms: cli
                .long_press_ms
                .or(file.long_press_ms)
                .unwrap_or(defaults.long_press_ms),
            usb_state_path: cli
                .usb_state_path
                .clone()
                .or(file.usb_state_path)
                .unwrap_or(defaults.usb_state_path),
            trackball_threshold: cli
                .trackball_threshold
                .or(file.trackball_threshold)
                .unwrap_or(defaults.trackball_threshold),
            reboot_command: cli
                .reboot_command
                .clone()
                .or(file.reboot_command)
                .unwrap_or(defaults.reboot_command),
            mount_command: cli
                .mount_command
                .clone()
                .or(file.mount_command)
                .unwrap_or(defaults.mount_command),
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.screen_width <= 0 || self.screen_height <= 0 {
            return Err("Screen size must be positive");
        }
        if self.menu_item_height <= 0 {
            return Err("Menu item height must be positive");
        }
        if self.lcd_density <= 0 {
            return Err("LCD density must be positive");
        }
        if self.trackball_threshold <= 0 {
            return Err("Trackball threshold must be positive");
        }
        if self.wait_timeout_secs == 0 {
            return Err("Wait timeout must be at least one second");
        }
        Ok(())
    }

    pub fn menu_geometry(&self) -> MenuGeometry {
        MenuGeometry {
            screen_width: self.screen_width,
            screen_height: self.screen_height,
            item_top: self.menu_item_top,
            item_height: self.menu_item_height,
            item_count: self.menu_item_count,
        }
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            tick: Duration::from_secs(1),
            timeout_ticks: self.wait_timeout_secs,
        }
    }

    pub fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            long_press: Duration::from_millis(self.long_press_ms),
            swipe: SwipeThresholds::from_density(self.lcd_density),
            trackball_threshold: self.trackball_threshold,
            select_feedback: SELECT_FEEDBACK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["recovery-input"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let config = Config::merge(&cli(&[]), file::FileConfig::default());
        assert_eq!(config.input_dir, PathBuf::from("/dev/input"));
        assert_eq!(config.control_socket, Some(PathBuf::from("/tmp/recovery-ui.sock")));
        assert_eq!(config.long_press_ms, 750);
        assert_eq!(config.wait_timeout_secs, 120);
        assert_eq!(config.trackball_threshold, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = file::FileConfig {
            lcd_density: Some(240),
            screen_width: Some(720),
            reboot_command: Some("busybox reboot".into()),
            ..Default::default()
        };
        let config = Config::merge(&cli(&["--lcd-density", "320"]), file);
        assert_eq!(config.lcd_density, 320);
        assert_eq!(config.screen_width, 720);
        assert_eq!(config.reboot_command, "busybox reboot");
    }

    #[test]
    fn test_no_control_from_either_source() {
        let config = Config::merge(&cli(&["--no-control"]), file::FileConfig::default());
        assert!(config.control_socket.is_none());

        let file = file::FileConfig {
            no_control: true,
            ..Default::default()
        };
        let config = Config::merge(&cli(&["--control-socket", "/tmp/x.sock"]), file);
        assert!(config.control_socket.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        let config = Config {
            menu_item_height: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            wait_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_derived_settings() {
        let config = Config {
            lcd_density: 320,
            long_press_ms: 500,
            ..Config::default()
        };
        let settings = config.router_settings();
        assert_eq!(settings.long_press, Duration::from_millis(500));
        assert_eq!(settings.swipe, SwipeThresholds::from_density(320));
        assert_eq!(config.wait_policy().timeout_ticks, 120);
        assert_eq!(config.menu_geometry().item_count, 6);
    }

    #[test]
    fn test_dump_subcommand() {
        let parsed = cli(&["dump", "/dev/input/event1", "--classify"]);
        match parsed.command {
            Some(Command::Dump { device, classify }) => {
                assert_eq!(device, PathBuf::from("/dev/input/event1"));
                assert!(classify);
            }
            None => panic!("expected dump subcommand"),
        }
    }
}
