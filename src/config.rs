use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[inline]
#[must_use]
pub const fn default_beep_frequency() -> u32 {
    2500
}

#[inline]
#[must_use]
pub const fn default_beep_duration() -> u64 {
    2000
}

fn default_time_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

/// user settings, kept separate from the alarm snapshot so editing one
/// never clobbers the other
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_time_format")]
    pub time_format: String,
    /// tone used by the `sound` notification kind
    #[serde(default = "default_beep_frequency")]
    pub beep_frequency_hz: u32,
    #[serde(default = "default_beep_duration")]
    pub beep_duration_ms: u64,
    /// overrides the calendar file in the config directory
    pub calendar_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_format: default_time_format(),
            beep_frequency_hz: default_beep_frequency(),
            beep_duration_ms: default_beep_duration(),
            calendar_file: None,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// a missing or unparseable config falls back to the defaults
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        toml::from_str(&contents).unwrap_or_else(|e| {
            log::warn!("couldn't parse config file {}: {e}", path.display());
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, config)?;
        Ok(())
    }

    #[must_use]
    pub fn config_path() -> PathBuf {
        let mut path = directories::ProjectDirs::from("", "", "wakey")
            .expect("couldn't get config path")
            .config_dir()
            .to_path_buf();
        path.push("config.toml");
        path
    }

    #[must_use]
    pub fn snapshot_path() -> PathBuf {
        let mut path = directories::ProjectDirs::from("", "", "wakey")
            .expect("couldn't get snapshot path")
            .config_dir()
            .to_path_buf();
        path.push("alarms.toml");
        path
    }

    /// where the file-backed calendar lives
    #[must_use]
    pub fn calendar_path(&self) -> PathBuf {
        self.calendar_file.clone().unwrap_or_else(|| {
            let mut path = directories::ProjectDirs::from("", "", "wakey")
                .expect("couldn't get calendar path")
                .config_dir()
                .to_path_buf();
            path.push("calendar.toml");
            path
        })
    }

    #[must_use]
    pub fn is_config_present() -> bool {
        Self::config_path().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_loads_defaults() {
        let path = std::env::temp_dir().join("wakey-test-config-none/config.toml");
        let config = Config::load(&path);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn config_round_trips() {
        let path = std::env::temp_dir().join("wakey-test-config/config.toml");
        let config = Config {
            time_format: "%H:%M".to_string(),
            beep_frequency_hz: 440,
            beep_duration_ms: 500,
            calendar_file: Some(PathBuf::from("/tmp/cal.toml")),
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path), config);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: Config = toml::from_str("time_format = \"%H:%M\"").unwrap();
        assert_eq!(config.beep_frequency_hz, default_beep_frequency());
        assert_eq!(config.beep_duration_ms, default_beep_duration());
        assert_eq!(config.calendar_file, None);
    }
}
