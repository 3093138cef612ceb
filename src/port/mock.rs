//! Mock serial backend for testing.
//!
//! Provides a `MockSerialPort` that behaves like a device whose read
//! timeouts have been programmed: when its receive queue is empty a read
//! sleeps for one timeout slice and returns zero bytes, exactly as a termios
//! `VTIME` read or a `COMMTIMEOUTS` read would. Clones share state, so a test
//! can keep one clone for inspection after handing another to `SerialPort`.

use super::baud::BaudRate;
use super::error::PortError;
use super::timeout::ReadTimeout;
use super::traits::{PortConfiguration, SerialBackend};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

/// Inner state of the mock port.
#[derive(Debug, Default)]
struct MockPortState {
    /// Bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Every write, in order.
    write_log: Vec<Vec<u8>>,
    /// Largest number of bytes a single low-level read hands back.
    read_chunk_limit: Option<usize>,
    /// Largest number of bytes a single low-level write accepts.
    write_chunk_limit: Option<usize>,
    /// Error kind the next read fails with.
    fail_next_read: Option<io::ErrorKind>,
    /// Whether custom rates are accepted by the simulated driver.
    reject_custom_rates: bool,
    /// Last configuration applied.
    configuration: Option<PortConfiguration>,
    /// Last timeout programmed.
    timeout: ReadTimeout,
    read_calls: u32,
    write_calls: u32,
    flushes: u32,
    closes: u32,
}

/// Mock serial port implementation for testing.
///
/// # Example
/// ```
/// use serial_link::port::{MockSerialPort, SerialPort};
///
/// let mock = MockSerialPort::new();
/// mock.enqueue_read(b"Hello, World!");
///
/// let mut port = SerialPort::from_backend("MOCK0", Box::new(mock.clone()));
/// port.configure(115200)?;
/// port.set_read_timeout(0)?;
///
/// assert_eq!(port.read(5)?, b"Hello");
/// port.write(b"Response")?;
/// assert_eq!(mock.write_log(), vec![b"Response".to_vec()]);
/// # Ok::<(), serial_link::PortError>(())
/// ```
#[derive(Clone, Default)]
pub struct MockSerialPort {
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock with empty queues and immediate timeouts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes to the receive queue.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Hand back at most `limit` bytes per low-level read.
    pub fn set_read_chunk_limit(&self, limit: Option<usize>) {
        self.state.lock().read_chunk_limit = limit;
    }

    /// Accept at most `limit` bytes per low-level write.
    pub fn set_write_chunk_limit(&self, limit: Option<usize>) {
        self.state.lock().write_chunk_limit = limit;
    }

    /// Make the next low-level read fail with `kind`.
    pub fn fail_next_read(&self, kind: io::ErrorKind) {
        self.state.lock().fail_next_read = Some(kind);
    }

    /// Simulate a driver that only supports the canonical rate table.
    pub fn reject_custom_rates(&self, reject: bool) {
        self.state.lock().reject_custom_rates = reject;
    }

    /// Get a copy of all data written to the port.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// All written bytes concatenated.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.state.lock().write_log.concat()
    }

    /// Bytes still waiting to be read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    pub fn configuration(&self) -> Option<PortConfiguration> {
        self.state.lock().configuration
    }

    pub fn timeout(&self) -> ReadTimeout {
        self.state.lock().timeout
    }

    /// Low-level reads issued so far, idle ones included.
    pub fn read_calls(&self) -> u32 {
        self.state.lock().read_calls
    }

    pub fn write_calls(&self) -> u32 {
        self.state.lock().write_calls
    }

    pub fn flushes(&self) -> u32 {
        self.state.lock().flushes
    }

    /// How many times the backend was released.
    pub fn closes(&self) -> u32 {
        self.state.lock().closes
    }
}

impl SerialBackend for MockSerialPort {
    fn configure(&mut self, config: &PortConfiguration) -> Result<(), PortError> {
        let mut state = self.state.lock();
        // Raw mode and immediate reads land before the rate is checked, as
        // with termios where the custom rate is applied last.
        state.timeout = ReadTimeout::IMMEDIATE;
        if let BaudRate::Custom(rate) = config.baud_rate {
            if state.reject_custom_rates {
                return Err(PortError::rejected(format!("{rate} baud not supported")));
            }
        }
        state.configuration = Some(*config);
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: &ReadTimeout) -> Result<(), PortError> {
        self.state.lock().timeout = *timeout;
        Ok(())
    }

    fn read_chunk(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let slice = {
            let mut state = self.state.lock();
            state.read_calls += 1;

            if let Some(kind) = state.fail_next_read.take() {
                return Err(io::Error::new(kind, "injected read failure"));
            }

            let limit = state.read_chunk_limit.unwrap_or(usize::MAX);
            let mut n = 0;
            for byte in buffer.iter_mut().take(limit) {
                match state.read_queue.pop_front() {
                    Some(b) => {
                        *byte = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            if n > 0 {
                return Ok(n);
            }
            state.timeout.slice()
        };

        // Idle: wait out one timeout slice without holding the lock.
        if !slice.is_zero() {
            std::thread::sleep(slice);
        }
        Ok(0)
    }

    fn write_chunk(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        state.write_calls += 1;
        let n = data.len().min(state.write_chunk_limit.unwrap_or(usize::MAX));
        state.write_log.push(data[..n].to_vec());
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.lock().flushes += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.state.lock().closes += 1;
        Ok(())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}
