//! Configuration for coin quest.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Gacha presentation settings.
    #[serde(default)]
    pub gacha: GachaConfig,
    /// Display settings.
    #[serde(default)]
    pub display: DisplayConfig,
    /// Override for the data directory (records and log file).
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gacha: GachaConfig::default(),
            display: DisplayConfig::default(),
            data_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from default path.
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Get configuration file path.
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "coin-quest")
            .map(|d| d.config_dir().join("config.toml"))
    }

    /// Directory holding the durable game records.
    pub fn data_path(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("", "", "coin-quest")
                .map(|d| d.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    /// Log file path. The TUI owns the terminal, so logs go to a file.
    pub fn log_path(&self) -> PathBuf {
        self.data_path().join("coin-quest.log")
    }
}

/// Gacha presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GachaConfig {
    /// Delay before the reward is committed and revealed, in milliseconds.
    #[serde(default = "default_reveal_ms")]
    pub reveal_ms: u64,
}

impl Default for GachaConfig {
    fn default() -> Self {
        Self {
            reveal_ms: default_reveal_ms(),
        }
    }
}

fn default_reveal_ms() -> u64 {
    2500
}

/// Display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Show per-question explanations in the answer feedback.
    #[serde(default = "default_true")]
    pub show_explanations: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_explanations: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.gacha.reveal_ms, 2500);
        assert!(config.display.show_explanations);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[gacha]\nreveal_ms = 100\n").unwrap();
        assert_eq!(config.gacha.reveal_ms, 100);
        assert!(config.display.show_explanations);
    }
}
