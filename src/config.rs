//! Configuration system
//!
//! Provides centralized configuration management with:
//! - Environment variable support
//! - Config file loading (optional)
//! - Runtime defaults
//! - Validation and type safety
//!
//! There is deliberately no process-wide singleton: the config is built once
//! in `main` and injected into the store, summarizer and engine constructors.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::range::RetentionPeriod;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Retention configuration
    pub retention: RetentionConfig,

    /// Prediction configuration
    pub prediction: PredictionConfig,

    /// Output configuration
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub log_directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the per-profile history/summary documents.
    pub data_dir: PathBuf,
    /// Expected collector cadence, used only to size the rolling raw log.
    pub samples_per_hour: u32,
    /// Width of the full-resolution window in hours.
    pub raw_window_hours: i64,
}

impl StorageConfig {
    /// Entry cap for the full-resolution raw window.
    pub fn raw_window_cap(&self) -> usize {
        (self.raw_window_hours.max(0) as usize) * self.samples_per_hour as usize
    }

    /// Hard entry cap for a given retention period.
    pub fn retention_cap(&self, period: RetentionPeriod) -> usize {
        (period.hours() as usize) * self.samples_per_hour as usize
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    pub period: RetentionPeriod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Trailing window for quota-exhaustion extrapolation.
    pub window_hours: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub json_pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".quotawatch");
        Self {
            logging: LoggingConfig {
                level: "ERROR".to_string(),
                format: "pretty".to_string(),
                output: "console".to_string(),
                log_directory: data_dir.join("logs"),
            },
            storage: StorageConfig {
                data_dir,
                samples_per_hour: 12,
                raw_window_hours: 24,
            },
            retention: RetentionConfig {
                period: RetentionPeriod::Week,
            },
            prediction: PredictionConfig { window_hours: 6 },
            output: OutputConfig { json_pretty: true },
        }
    }
}

impl Config {
    /// Load configuration from environment, file, and defaults
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        // Try to load from config file if it exists
        let config_paths = [
            PathBuf::from("quotawatch.toml"),
            PathBuf::from(".quotawatch.toml"),
            dirs::config_dir()
                .map(|d| d.join("quotawatch").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        // Override with environment variables
        config.apply_env_overrides()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        // Storage overrides
        if let Ok(val) = env::var("QUOTAWATCH_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = env::var("QUOTAWATCH_SAMPLES_PER_HOUR") {
            self.storage.samples_per_hour =
                val.parse().context("Invalid QUOTAWATCH_SAMPLES_PER_HOUR")?;
        }
        if let Ok(val) = env::var("QUOTAWATCH_LOG_DIR") {
            self.logging.log_directory = PathBuf::from(val);
        }

        // Retention override
        if let Ok(val) = env::var("QUOTAWATCH_RETENTION") {
            self.retention.period = val.parse().context("Invalid QUOTAWATCH_RETENTION")?;
        }

        // Prediction override
        if let Ok(val) = env::var("QUOTAWATCH_PREDICTION_WINDOW_HOURS") {
            self.prediction.window_hours = val
                .parse()
                .context("Invalid QUOTAWATCH_PREDICTION_WINDOW_HOURS")?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.storage.samples_per_hour == 0 {
            return Err(anyhow::anyhow!("samples_per_hour must be greater than 0"));
        }

        if self.storage.raw_window_hours <= 0 {
            return Err(anyhow::anyhow!("raw_window_hours must be greater than 0"));
        }

        if self.prediction.window_hours == 0 {
            return Err(anyhow::anyhow!(
                "prediction window_hours must be greater than 0"
            ));
        }

        // The log directory is only needed when logging to files
        if matches!(self.logging.output.as_str(), "file" | "both")
            && !self.logging.log_directory.exists()
        {
            fs::create_dir_all(&self.logging.log_directory)
                .context("Failed to create log directory")?;
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "ERROR");
        assert_eq!(config.storage.samples_per_hour, 12);
        assert_eq!(config.storage.raw_window_hours, 24);
        assert_eq!(config.retention.period, RetentionPeriod::Week);
        assert_eq!(config.prediction.window_hours, 6);
    }

    #[test]
    fn test_window_caps() {
        let config = Config::default();
        assert_eq!(config.storage.raw_window_cap(), 288);
        assert_eq!(config.storage.retention_cap(RetentionPeriod::Week), 2016);
        assert_eq!(config.storage.retention_cap(RetentionPeriod::Month), 8640);
    }

    #[test]
    fn test_env_override() {
        env::set_var("QUOTAWATCH_SAMPLES_PER_HOUR", "6");
        env::set_var("QUOTAWATCH_RETENTION", "30d");
        let mut config = Config::default();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.storage.samples_per_hour, 6);
        assert_eq!(config.retention.period, RetentionPeriod::Month);
        env::remove_var("QUOTAWATCH_SAMPLES_PER_HOUR");
        env::remove_var("QUOTAWATCH_RETENTION");
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.storage.samples_per_hour = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.prediction.window_hours = 0;
        assert!(config.validate().is_err());
    }
}
