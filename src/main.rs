mod dump;

use std::sync::Arc;

use clap::Parser;

use recovery_input::config::{Cli, Command, Config};
use recovery_input::display::HeadlessDisplay;
use recovery_input::input::event::code_name;
use recovery_input::input::event::EV_KEY;
use recovery_input::input::WaitOutcome;
use recovery_input::policy::DefaultPolicy;
use recovery_input::system::CommandActions;
use recovery_input::RecoveryInput;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load(&cli);

    if let Some(Command::Dump { device, classify }) = &cli.command {
        return dump::run_dump(device, *classify, &config);
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    log::info!(
        "recovery-input starting (input={}, control={}, screen={}x{}, density={})",
        config.input_dir.display(),
        config
            .control_socket
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "off".into()),
        config.screen_width,
        config.screen_height,
        config.lcd_density
    );

    let display = Arc::new(HeadlessDisplay::new(config.menu_geometry()));
    let input = RecoveryInput::init(
        &config,
        display,
        Box::new(DefaultPolicy::new()),
        Box::new(CommandActions::new(
            config.reboot_command.clone(),
            config.mount_command.clone(),
        )),
    )?;

    loop {
        match input.wait_key() {
            WaitOutcome::Key(code) => println!("key {}", code_name(EV_KEY, code)),
            WaitOutcome::MenuRow(row) => println!("menu row {}", row),
            WaitOutcome::Cancelled => println!("cancelled"),
            WaitOutcome::Refresh => println!("refresh"),
            WaitOutcome::TimedOut => log::debug!("wait_key timed out"),
        }
    }
}
