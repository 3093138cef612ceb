//! Port abstraction layer for serial communication.
//!
//! `SerialPort` is the handle callers use. Each OS family implements the
//! `SerialBackend` trait (termios on Unix, the COMM API on Windows), and
//! `MockSerialPort` stands in for hardware in tests.

pub mod baud;
pub mod device_name;
pub mod discovery;
pub mod error;
pub mod handle;
pub mod mock;
pub mod read;
pub mod timeout;
pub mod traits;

#[cfg(unix)]
pub mod posix;

#[cfg(windows)]
pub mod windows;

pub use baud::{BaudRate, StandardBaud};
pub use device_name::normalize_device_name;
pub use discovery::{available_ports, PortInfo, PortKind};
pub use error::PortError;
pub use handle::SerialPort;
pub use mock::MockSerialPort;
pub use read::ReadSummary;
pub use timeout::{CommTimeouts, ReadPolicy, ReadTimeout, Resolution};
pub use traits::*;
