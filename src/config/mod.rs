//! Application configuration.
//!
//! A small TOML file under the platform config directory. Every key has a
//! default and the file is optional, so a fresh install needs no setup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// How often the devtools visibility flag is sampled, in ms.
    pub devtools_poll_interval_ms: u64,
    /// How many control-window debug messages are retained.
    pub debug_console_capacity: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            devtools_poll_interval_ms: 1000,
            debug_console_capacity: 256,
        }
    }
}

impl ShellConfig {
    /// Path of the config file, creating the directory if needed.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("shellbridge")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".shellbridge")
        };

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            log::info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the config file; a missing file means defaults.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            log::debug!("no config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        log::debug!("loaded config from {:?}", path);
        Ok(config)
    }

    /// Poll interval, clamped to at least 1ms: the interval timer the
    /// devtools poll is built on panics on a zero period.
    pub fn devtools_poll_interval(&self) -> Duration {
        Duration::from_millis(self.devtools_poll_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: ShellConfig = toml::from_str("").unwrap();
        assert_eq!(config, ShellConfig::default());
        assert_eq!(config.devtools_poll_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_partial_file_keeps_remaining_defaults() {
        let config: ShellConfig = toml::from_str("devtools_poll_interval_ms = 50").unwrap();
        assert_eq!(config.devtools_poll_interval_ms, 50);
        assert_eq!(config.debug_console_capacity, 256);
    }

    #[test]
    fn test_full_file_overrides_everything() {
        let config: ShellConfig = toml::from_str(
            "devtools_poll_interval_ms = 250\ndebug_console_capacity = 16\n",
        )
        .unwrap();
        assert_eq!(
            config,
            ShellConfig {
                devtools_poll_interval_ms: 250,
                debug_console_capacity: 16,
            }
        );
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let config: ShellConfig = toml::from_str("devtools_poll_interval_ms = 0").unwrap();
        assert_eq!(config.devtools_poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(toml::from_str::<ShellConfig>("devtools_poll_interval_ms = \"soon\"").is_err());
    }
}
