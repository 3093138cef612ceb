//! Configuration module for serial_link.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_LINK_CONFIG` environment variable (explicit path)
//! 2. `./serial-link.toml` (current directory)
//! 3. `serial-link.toml` in the platform config directory
//!    (`~/.config/serial-link/` on Linux, `%APPDATA%\serial-link\config\` on Windows)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Any configuration value can be overridden via environment variables.
//! The pattern is: `SERIAL_LINK_<SECTION>_<KEY>`
//!
//! Examples:
//! - `SERIAL_LINK_SERIAL_DEFAULT_BAUD=9600`
//! - `SERIAL_LINK_SERIAL_READ_TIMEOUT_MS=250`
//! - `SERIAL_LINK_LOGGING_LEVEL=debug`
//!
//! Legacy `TEST_PORT`, `TEST_BAUD` and `TEST_LOOPBACK` are honored for the
//! `[testing]` section.
//!
//! # Example
//!
//! ```rust,no_run
//! use serial_link::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let serial = &loader.config().serial;
//!
//! println!("Default baud: {}", serial.default_baud);
//! println!("Worst-case read: {:?}", serial.read_policy().max_read_duration(&serial.read_timeout()));
//! # Ok::<(), serial_link::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, LogFormat, LoggingConfig, SerialConfig, TestingConfig};
