mod cli;
mod file;

pub use cli::{Cli, Command};

use std::path::PathBuf;
use std::time::Duration;

use file::FileConfig;

use crate::input::{INPUT_EVENT_SIZE_32, INPUT_EVENT_SIZE_64};

/// Merged configuration from CLI args and TOML file.
#[derive(Debug, Clone)]
pub struct Config {
    pub device_name: String,
    pub device_path: Option<PathBuf>,
    pub grab_input: bool,
    pub idle_poll: Duration,
    pub virtual_device_name: String,
    pub replay: Option<PathBuf>,
    pub record_size: usize,
    pub dry_run: bool,
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

    fn merge(cli: &Cli, file_config: FileConfig) -> Self {
        Self {
            device_name: cli.device_name.clone().unwrap_or(file_config.device_name),
            device_path: cli.device_path.clone().or(file_config.device_path),
            grab_input: !cli.no_grab && file_config.grab_input,
            idle_poll: Duration::from_millis(cli.idle_poll_ms.unwrap_or(file_config.idle_poll_ms)),
            virtual_device_name: cli
                .virtual_device_name
                .clone()
                .unwrap_or(file_config.virtual_device_name),
            replay: cli.replay.clone(),
            record_size: cli.record_size,
            dry_run: cli.dry_run,
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.idle_poll.is_zero() {
            return Err("idle poll interval must be greater than zero");
        }
        if self.record_size != INPUT_EVENT_SIZE_32 && self.record_size != INPUT_EVENT_SIZE_64 {
            return Err("record size must be 16 or 24");
        }
        if self.device_name.is_empty() && self.device_path.is_none() && self.replay.is_none() {
            return Err("no device name or path given");
        }
        Ok(())
    }
}
