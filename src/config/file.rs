use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub input_dir: Option<PathBuf>,
    pub control_socket: Option<PathBuf>,
    #[serde(default)]
    pub no_control: bool,
    pub lcd_density: Option<i32>,
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
    pub menu_item_top: Option<i32>,
    pub menu_item_height: Option<i32>,
    pub menu_item_count: Option<usize>,
    pub wait_timeout_secs: Option<u32>,
    pub long_press_ms: Option<u64>,
    pub usb_state_path: Option<PathBuf>,
    pub trackball_threshold: Option<i32>,
    pub reboot_command: Option<String>,
    pub mount_command: Option<String>,
}

pub fn load_from_path(path: &Path) -> Option<FileConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    parse(&content, path)
}

fn parse(content: &str, path: &Path) -> Option<FileConfig> {
    match toml::from_str(content) {
        Ok(config) => {
            log::debug!("Loaded config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

pub fn load_from_default_paths() -> Option<FileConfig> {
    for path in default_config_paths() {
        if path.exists() {
            if let Some(config) = load_from_path(&path) {
                return Some(config);
            }
        }
    }
    None
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("recovery-input.toml")];

    if let Ok(home) = std::env::var("HOME") {
        paths.push(PathBuf::from(home).join(".config").join("recovery-input.toml"));
    }

    paths
}
