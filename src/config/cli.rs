use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "recovery-input")]
#[command(about = "Touch, gesture and hardware-key input core for a recovery console")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Directory scanned for event* input nodes
    #[arg(long, env = "RECOVERY_INPUT_DIR")]
    pub input_dir: Option<PathBuf>,

    /// Path of the control socket
    #[arg(long, env = "RECOVERY_INPUT_SOCKET")]
    pub control_socket: Option<PathBuf>,

    /// Do not open the control socket
    #[arg(long)]
    pub no_control: bool,

    /// LCD density in dpi, used to size swipe thresholds
    #[arg(long)]
    pub lcd_density: Option<i32>,

    /// Framebuffer width in pixels
    #[arg(long)]
    pub screen_width: Option<i32>,

    /// Framebuffer height in pixels
    #[arg(long)]
    pub screen_height: Option<i32>,

    /// Y coordinate of the first menu row
    #[arg(long)]
    pub menu_item_top: Option<i32>,

    /// Height of one menu row in pixels
    #[arg(long)]
    pub menu_item_height: Option<i32>,

    /// Number of menu rows
    #[arg(long)]
    pub menu_item_count: Option<usize>,

    /// Seconds wait_key blocks before timing out (unless USB is connected)
    #[arg(long)]
    pub wait_timeout_secs: Option<u32>,

    /// Hold time before a key press counts as a long press
    #[arg(long)]
    pub long_press_ms: Option<u64>,

    /// USB gadget state file used to detect a connected cable
    #[arg(long)]
    pub usb_state_path: Option<PathBuf>,

    /// Accumulated trackball motion needed for one up/down step
    #[arg(long)]
    pub trackball_threshold: Option<i32>,

    /// Shell command run by the reboot hot key
    #[arg(long)]
    pub reboot_command: Option<String>,

    /// Shell command run by the mount hot key
    #[arg(long)]
    pub mount_command: Option<String>,

    /// Path to config file
    #[arg(long, env = "RECOVERY_INPUT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Dump raw input events for debugging
    Dump {
        /// Input device node, e.g. /dev/input/event1
        device: PathBuf,

        /// Also run events through the touch classifier and print touch phases
        #[arg(long)]
        classify: bool,
    },
}
