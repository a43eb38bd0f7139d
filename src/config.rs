//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::downlink::MAX_CHUNK_SIZE;
use crate::error::{HousekeepingError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub radio: RadioConfig,
    pub housekeeping: HousekeepingConfig,
}

/// Storage media configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_sd_root")]
    pub sd_root: String,

    #[serde(default = "default_system_root")]
    pub system_root: String,

    #[serde(default = "default_sd_card_present")]
    pub sd_card_present: bool,

    #[serde(default = "default_max_log_bytes")]
    pub max_log_bytes: u64,

    #[serde(default = "default_data_file")]
    pub default_data_file: String,
}

/// Downlink radio configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RadioConfig {
    #[serde(default = "default_radio_enabled")]
    pub enabled: bool,

    #[serde(default = "default_radio_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_downlink_interval_s")]
    pub downlink_interval_s: u64,
}

/// Housekeeping loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HousekeepingConfig {
    #[serde(default = "default_interval_s")]
    pub interval_s: u64,

    #[serde(default = "default_diagnostics_dir")]
    pub diagnostics_dir: String,
}

// Default value functions
fn default_sd_root() -> String { "/sd".to_string() }
fn default_system_root() -> String { "/".to_string() }
fn default_sd_card_present() -> bool { true }
fn default_max_log_bytes() -> u64 { 100_000_000 }
fn default_data_file() -> String { "default.txt".to_string() }

fn default_radio_enabled() -> bool { true }
fn default_radio_port() -> String { "/dev/ttyS0".to_string() }
fn default_baud_rate() -> u32 { 115200 }
fn default_timeout_ms() -> u64 { 100 }
fn default_chunk_size() -> usize { MAX_CHUNK_SIZE }
fn default_downlink_interval_s() -> u64 { 600 }

fn default_interval_s() -> u64 { 60 }
fn default_diagnostics_dir() -> String { "./diagnostics".to_string() }

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sd_root: default_sd_root(),
            system_root: default_system_root(),
            sd_card_present: default_sd_card_present(),
            max_log_bytes: default_max_log_bytes(),
            default_data_file: default_data_file(),
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            enabled: default_radio_enabled(),
            port: default_radio_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
            chunk_size: default_chunk_size(),
            downlink_interval_s: default_downlink_interval_s(),
        }
    }
}

impl Default for HousekeepingConfig {
    fn default() -> Self {
        Self {
            interval_s: default_interval_s(),
            diagnostics_dir: default_diagnostics_dir(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            radio: RadioConfig::default(),
            housekeeping: HousekeepingConfig::default(),
        }
    }
}

fn invalid(msg: &str) -> HousekeepingError {
    HousekeepingError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use qube_housekeeping::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Validate storage configuration
        if self.storage.sd_root.is_empty() {
            return Err(invalid("sd_root cannot be empty"));
        }

        if self.storage.system_root.is_empty() {
            return Err(invalid("system_root cannot be empty"));
        }

        if self.storage.default_data_file.is_empty() {
            return Err(invalid("default_data_file cannot be empty"));
        }

        if self.storage.max_log_bytes == 0 {
            return Err(invalid("max_log_bytes must be greater than 0"));
        }

        // Validate radio configuration
        if self.radio.enabled && self.radio.port.is_empty() {
            return Err(invalid("radio port cannot be empty when enabled"));
        }

        if ![9600, 19200, 38400, 57600, 115200].contains(&self.radio.baud_rate) {
            return Err(invalid("baud_rate must be one of: 9600, 19200, 38400, 57600, 115200"));
        }

        if self.radio.timeout_ms == 0 || self.radio.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        if self.radio.chunk_size == 0 || self.radio.chunk_size > MAX_CHUNK_SIZE {
            return Err(HousekeepingError::Config(toml::de::Error::custom(format!(
                "chunk_size must be between 1 and {}",
                MAX_CHUNK_SIZE
            ))));
        }

        if self.radio.downlink_interval_s == 0 {
            return Err(invalid("downlink_interval_s must be greater than 0"));
        }

        // Validate housekeeping loop
        if self.housekeeping.interval_s == 0 || self.housekeeping.interval_s > 86400 {
            return Err(invalid("interval_s must be between 1 and 86400"));
        }

        if self.housekeeping.diagnostics_dir.is_empty() {
            return Err(invalid("diagnostics_dir cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[storage]
sd_root = "/mnt/sd"

[radio]
port = "/dev/ttyUSB0"

[housekeeping]
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.storage.sd_root, "/mnt/sd");
        assert_eq!(config.radio.port, "/dev/ttyUSB0");
        assert_eq!(config.storage.max_log_bytes, 100_000_000);
        assert_eq!(config.radio.chunk_size, 249);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/housekeeping.toml"),
            Err(HousekeepingError::Io(_))
        ));
    }

    #[test]
    fn test_missing_section_is_an_error() {
        assert!(matches!(
            Config::from_toml("[storage]\n[radio]\n"),
            Err(HousekeepingError::Config(_))
        ));
    }

    #[test]
    fn test_shipped_default_config_is_valid() {
        let contents = include_str!("../config/default.toml");
        assert!(Config::from_toml(contents).is_ok());
    }

    #[test]
    fn test_empty_sd_root() {
        let mut config = Config::default();
        config.storage.sd_root = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_system_root() {
        let mut config = Config::default();
        config.storage.system_root = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_default_data_file() {
        let mut config = Config::default();
        config.storage.default_data_file = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_log_bytes_zero() {
        let mut config = Config::default();
        config.storage.max_log_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_port_when_enabled() {
        let mut config = Config::default();
        config.radio.enabled = true;
        config.radio.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_port_when_disabled() {
        let mut config = Config::default();
        config.radio.enabled = false;
        config.radio.port = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_baud_rate() {
        let mut config = Config::default();
        config.radio.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_baud_rates() {
        for &baud in &[9600, 19200, 38400, 57600, 115200] {
            let mut config = Config::default();
            config.radio.baud_rate = baud;
            assert!(config.validate().is_ok(), "Baud rate {} should be valid", baud);
        }
    }

    #[test]
    fn test_timeout_ms_bounds() {
        let mut config = Config::default();
        config.radio.timeout_ms = 0;
        assert!(config.validate().is_err());
        config.radio.timeout_ms = 10001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_chunk_size_bounds() {
        let mut config = Config::default();
        config.radio.chunk_size = 0;
        assert!(config.validate().is_err());
        config.radio.chunk_size = 250;
        assert!(config.validate().is_err());
        config.radio.chunk_size = 1;
        assert!(config.validate().is_ok());
        config.radio.chunk_size = 249;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_downlink_interval_zero() {
        let mut config = Config::default();
        config.radio.downlink_interval_s = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interval_bounds() {
        let mut config = Config::default();
        config.housekeeping.interval_s = 0;
        assert!(config.validate().is_err());
        config.housekeeping.interval_s = 86401;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_diagnostics_dir() {
        let mut config = Config::default();
        config.housekeeping.diagnostics_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_sd_root(), "/sd");
        assert_eq!(default_system_root(), "/");
        assert_eq!(default_sd_card_present(), true);
        assert_eq!(default_max_log_bytes(), 100_000_000);
        assert_eq!(default_data_file(), "default.txt");
        assert_eq!(default_radio_enabled(), true);
        assert_eq!(default_radio_port(), "/dev/ttyS0");
        assert_eq!(default_baud_rate(), 115200);
        assert_eq!(default_timeout_ms(), 100);
        assert_eq!(default_chunk_size(), 249);
        assert_eq!(default_downlink_interval_s(), 600);
        assert_eq!(default_interval_s(), 60);
        assert_eq!(default_diagnostics_dir(), "./diagnostics");
    }
}
