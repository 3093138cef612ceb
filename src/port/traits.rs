//! Core traits for serial port abstraction.
//!
//! Defines the `SerialBackend` trait behind which each OS family (and the
//! test mock) implements the raw operations. `SerialPort` owns exactly one
//! backend and layers the lifecycle rules and the bounded read on top.

use super::baud::BaudRate;
use super::error::PortError;
use super::timeout::ReadTimeout;
use std::io;

/// Character framing. Fixed at 8 data bits, no parity, one stop bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framing {
    pub data_bits: u8,
    pub parity_enabled: bool,
    pub stop_bits: u8,
}

impl Framing {
    /// 8-N-1, the only framing this crate applies.
    pub const EIGHT_N_ONE: Framing = Framing {
        data_bits: 8,
        parity_enabled: false,
        stop_bits: 1,
    };
}

/// Settings applied by `configure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfiguration {
    /// Line speed.
    pub baud_rate: BaudRate,
    /// Always 8-N-1.
    pub framing: Framing,
}

impl PortConfiguration {
    pub fn new(baud_rate: BaudRate) -> Self {
        Self {
            baud_rate,
            framing: Framing::EIGHT_N_ONE,
        }
    }
}

/// Raw operations one OS family provides for an open device.
///
/// Implementations own the device resource. None of the methods retry on
/// their own; `read_chunk` and `write_chunk` are single OS calls (apart from
/// transparent `EINTR` restarts).
pub trait SerialBackend: Send + std::fmt::Debug {
    /// Apply the rate, 8-N-1 framing, raw mode, and immediate read timeouts.
    fn configure(&mut self, config: &PortConfiguration) -> Result<(), PortError>;

    /// Program the OS read timeout.
    fn set_read_timeout(&mut self, timeout: &ReadTimeout) -> Result<(), PortError>;

    /// One low-level read. `Ok(0)` means nothing arrived within one timeout
    /// slice.
    fn read_chunk(&mut self, buffer: &mut [u8]) -> io::Result<usize>;

    /// One low-level write. May accept fewer bytes than offered.
    fn write_chunk(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Block until queued output has been transmitted.
    fn flush(&mut self) -> io::Result<()>;

    /// Release the device. Called at most once by `SerialPort`.
    fn close(&mut self) -> io::Result<()>;
}
