//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! Every section falls back to its defaults, so an empty file is valid.

use super::error::{ConfigError, ConfigResult};
use crate::port::{ReadPolicy, ReadTimeout};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port defaults
    pub serial: SerialConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Hardware testing configuration
    pub testing: TestingConfig,
}

impl Config {
    /// Reject values that would make a port unusable.
    pub fn validate(&self) -> ConfigResult<()> {
        self.serial.validate()?;
        self.logging.validate()
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Baud rate applied by `SerialPort::open_configured`
    pub default_baud: u32,
    /// Read timeout in milliseconds; 0 means non-blocking
    pub read_timeout_ms: u32,
    /// Idle reads a single read call may absorb
    pub idle_retry_ceiling: u32,
    /// Port aliases for convenience
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            default_baud: 115200,
            read_timeout_ms: 1000,
            idle_retry_ceiling: crate::port::timeout::DEFAULT_IDLE_RETRY_CEILING,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// The configured read timeout at the native resolution.
    pub fn read_timeout(&self) -> ReadTimeout {
        ReadTimeout::from_millis(self.read_timeout_ms)
    }

    pub fn read_policy(&self) -> ReadPolicy {
        ReadPolicy::with_idle_retries(self.idle_retry_ceiling)
    }

    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.default_baud == 0 {
            return Err(ConfigError::validation("serial.default_baud", "must be non-zero"));
        }
        if self.idle_retry_ceiling == 0 {
            return Err(ConfigError::validation(
                "serial.idle_retry_ceiling",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error", "off"
    pub level: String,
    /// Log format: "pretty", "compact", "full"
    pub format: LogFormat,
    /// Emit ANSI colors
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    const LEVELS: [&'static str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

    fn validate(&self) -> ConfigResult<()> {
        if !Self::LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logging.level",
                format!("unknown level '{}'", self.level),
            ));
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human oriented
    Pretty,
    /// Single line, abbreviated
    Compact,
    /// Single line with all fields
    #[default]
    Full,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "full" => Ok(Self::Full),
            other => Err(ConfigError::validation(
                "logging.format",
                format!("unknown format '{other}'"),
            )),
        }
    }
}

/// Hardware testing configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestingConfig {
    /// Test port name
    pub port: Option<String>,
    /// Test baud rate
    pub baud: u32,
    /// Whether TX is wired to RX on the test port
    pub loopback_enabled: bool,
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: 115200,
            loopback_enabled: false,
        }
    }
}
