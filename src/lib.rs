//! Serial Link Library
//!
//! Portable access to serial communication devices: open a port by name,
//! configure it for raw 8-N-1 at a chosen baud rate, program a read timeout,
//! and move bytes in both directions with a bounded, retrying read.
//!
//! # Modules
//!
//! - `port`: The `SerialPort` handle, the per-OS backends, and a mock backend
//! - `config`: Configuration management with TOML support
//! - `logging`: `tracing` subscriber setup driven by the `[logging]` section
//!
//! # Example
//!
//! ```no_run
//! use serial_link::SerialPort;
//!
//! let mut port = SerialPort::open("/dev/ttyUSB0")?;
//! port.configure(57600)?;
//! port.set_read_timeout(100)?;
//! port.write(&[0x5a, 0xa6])?;
//! let ack = port.read(2)?;
//! port.close();
//! # Ok::<(), serial_link::PortError>(())
//! ```

pub mod config;
pub mod logging;
pub mod port;

// Re-export commonly used types for convenience
pub use port::{
    available_ports, BaudRate, Framing, MockSerialPort, PortConfiguration, PortError, PortInfo,
    PortKind, ReadPolicy, ReadSummary, ReadTimeout, SerialBackend, SerialPort, StandardBaud,
};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
