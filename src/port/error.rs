//! Port-specific error types.
//!
//! Short reads and short writes are not errors: they are reported through the
//! returned byte count. Everything here is a genuine failure.

use std::io;
use thiserror::Error;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// The caller is not allowed to open the device.
    #[error("Permission denied opening serial port: {0}")]
    PermissionDenied(String),

    /// The device is held exclusively by another owner.
    #[error("Serial port is busy: {0}")]
    Busy(String),

    /// The OS refused the requested baud rate, framing or timeout settings.
    #[error("Configuration rejected: {0}")]
    ConfigurationRejected(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The handle was closed; it can never be used again.
    #[error("Port is closed")]
    Closed,

    /// Enumerating the system's serial ports failed.
    #[error("Port discovery failed: {0}")]
    Discovery(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a ConfigurationRejected error from a message.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::ConfigurationRejected(message.into())
    }

    /// Classify an OS error raised while opening `port_name`.
    pub fn from_open_error(port_name: &str, err: io::Error) -> Self {
        if is_busy(&err) {
            return Self::Busy(port_name.to_string());
        }
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(port_name.to_string()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(port_name.to_string()),
            _ if is_missing_device(&err) => Self::NotFound(port_name.to_string()),
            _ => Self::Io(err),
        }
    }

    /// Wrap an OS error raised by a configuration call.
    pub fn rejected_by_os(operation: &str, err: io::Error) -> Self {
        Self::ConfigurationRejected(format!("{operation} failed: {err}"))
    }

    /// Whether this error came from the OS during a transfer.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

#[cfg(unix)]
fn is_busy(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EBUSY)
}

// COM ports held by another process report access denied rather than a
// sharing violation on most drivers.
#[cfg(windows)]
fn is_busy(err: &io::Error) -> bool {
    use winapi::shared::winerror::{ERROR_ACCESS_DENIED, ERROR_SHARING_VIOLATION};

    matches!(
        err.raw_os_error(),
        Some(code) if code == ERROR_ACCESS_DENIED as i32 || code == ERROR_SHARING_VIOLATION as i32
    )
}

#[cfg(not(any(unix, windows)))]
fn is_busy(_err: &io::Error) -> bool {
    false
}

#[cfg(unix)]
fn is_missing_device(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(libc::ENXIO) | Some(libc::ENODEV))
}

#[cfg(not(unix))]
fn is_missing_device(_err: &io::Error) -> bool {
    false
}

impl From<PortError> for io::Error {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Io(inner) => inner,
            PortError::NotFound(_) => io::Error::new(io::ErrorKind::NotFound, err),
            PortError::PermissionDenied(_) => io::Error::new(io::ErrorKind::PermissionDenied, err),
            PortError::Closed => io::Error::new(io::ErrorKind::NotConnected, err),
            PortError::ConfigurationRejected(_) => io::Error::new(io::ErrorKind::InvalidInput, err),
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}
