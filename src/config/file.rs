use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_DEVICE_NAME: &str = "ILTP7807:00 222A:FFF1";
pub const DEFAULT_VIRTUAL_DEVICE_NAME: &str = "Screenpad Unified Handler";
pub const DEFAULT_IDLE_POLL_MS: u64 = 10;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default = "default_device_name")]
    pub device_name: String,
    pub device_path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub grab_input: bool,
    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,
    #[serde(default = "default_virtual_device_name")]
    pub virtual_device_name: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            device_path: None,
            grab_input: true,
            idle_poll_ms: DEFAULT_IDLE_POLL_MS,
            virtual_device_name: default_virtual_device_name(),
        }
    }
}

fn default_device_name() -> String {
    DEFAULT_DEVICE_NAME.into()
}

fn default_virtual_device_name() -> String {
    DEFAULT_VIRTUAL_DEVICE_NAME.into()
}

fn default_idle_poll_ms() -> u64 {
    DEFAULT_IDLE_POLL_MS
}

fn default_true() -> bool {
    true
}

pub fn parse(content: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(content)
}

pub fn load_from_path(path: &Path) -> Option<FileConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match parse(&content) {
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
    let mut paths = Vec::new();

    paths.push(PathBuf::from("screenpad.toml"));

    if let Ok(home) = std::env::var("HOME") {
        paths.push(PathBuf::from(home).join(".config").join("screenpad.toml"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        assert_eq!(parse("").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let config = parse(
            r#"
            device_path = "/dev/input/event7"
            grab_input = false
            "#,
        )
        .unwrap();
        assert_eq!(config.device_path, Some(PathBuf::from("/dev/input/event7")));
        assert!(!config.grab_input);
        assert_eq!(config.device_name, DEFAULT_DEVICE_NAME);
        assert_eq!(config.idle_poll_ms, DEFAULT_IDLE_POLL_MS);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(parse("sensitivity = 2.0").is_err());
    }
}
