//! The serial port handle.
//!
//! `SerialPort` owns one backend from `open` until `close`. Once closed, every
//! operation fails with `PortError::Closed`; closing again is a no-op.

use super::baud::BaudRate;
use super::device_name::normalize_device_name;
use super::error::PortError;
use super::read::{read_bounded, ReadSummary};
use super::timeout::{ReadPolicy, ReadTimeout};
use super::traits::{PortConfiguration, SerialBackend};
use crate::config::SerialConfig;
use std::io;
use std::time::Duration;
use tracing::{debug, trace, warn};

#[cfg(unix)]
type NativeBackend = super::posix::PosixSerialPort;

#[cfg(windows)]
type NativeBackend = super::windows::WindowsSerialPort;

/// An open serial device.
///
/// The OS resource (a file descriptor or a `HANDLE`) is owned by the boxed
/// backend and never exposed. All I/O takes `&mut self`, so a handle is
/// driven from one place at a time.
pub struct SerialPort {
    name: String,
    backend: Option<Box<dyn SerialBackend>>,
    configuration: Option<PortConfiguration>,
    read_timeout: ReadTimeout,
    read_policy: ReadPolicy,
}

impl SerialPort {
    /// Open the named device with the platform backend.
    ///
    /// # Arguments
    /// * `port_name` - `/dev/ttyUSB0` style path, or `COM12` / `\\.\COM12` on Windows
    ///
    /// # Example
    /// ```no_run
    /// use serial_link::port::SerialPort;
    ///
    /// let mut port = SerialPort::open("/dev/ttyUSB0")?;
    /// port.configure(115200)?;
    /// port.set_read_timeout(200)?;
    /// let reply = port.read(16)?;
    /// # Ok::<(), serial_link::PortError>(())
    /// ```
    #[cfg(any(unix, windows))]
    pub fn open(port_name: &str) -> Result<Self, PortError> {
        let path = normalize_device_name(port_name);
        match NativeBackend::open(&path) {
            Ok(backend) => {
                trace!(port = %path, "opened");
                Ok(Self::from_backend(port_name, Box::new(backend)))
            }
            Err(e) => {
                warn!(port = %path, error = %e, "could not open serial port");
                Err(e)
            }
        }
    }

    /// Open, configure and apply timeouts from a `[serial]` config section.
    ///
    /// `port_name` is resolved through the configured aliases first.
    #[cfg(any(unix, windows))]
    pub fn open_configured(port_name: &str, config: &SerialConfig) -> Result<Self, PortError> {
        let mut port = Self::open(&config.resolve_port(port_name))?;
        port.configure(config.default_baud)?;
        port.set_read_timeout(config.read_timeout_ms)?;
        port.set_read_policy(config.read_policy());
        Ok(port)
    }

    /// Wrap an already-open backend.
    pub fn from_backend(name: impl Into<String>, backend: Box<dyn SerialBackend>) -> Self {
        Self {
            name: name.into(),
            backend: Some(backend),
            configuration: None,
            read_timeout: ReadTimeout::IMMEDIATE,
            read_policy: ReadPolicy::default(),
        }
    }

    /// The name this port was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        self.backend.is_some()
    }

    /// True once `configure` has succeeded on this handle.
    pub fn is_configured(&self) -> bool {
        self.is_open() && self.configuration.is_some()
    }

    /// Settings applied by the last successful `configure`.
    pub fn configuration(&self) -> Option<&PortConfiguration> {
        self.configuration.as_ref()
    }

    fn backend(&mut self) -> Result<&mut Box<dyn SerialBackend>, PortError> {
        self.backend.as_mut().ok_or(PortError::Closed)
    }

    /// Set the line speed and put the port in raw 8-N-1 mode.
    ///
    /// Rates in the canonical table use the OS symbolic constants; any other
    /// non-zero rate goes through the custom-rate path and fails with
    /// `ConfigurationRejected` if the driver does not take it. Configuring
    /// also resets reads to immediate; call `set_read_timeout` afterwards.
    ///
    /// A rejected configuration may already have been partly applied, so on
    /// failure the handle reports immediate reads and is no longer
    /// configured.
    pub fn configure(&mut self, baud_rate: u32) -> Result<(), PortError> {
        let baud = BaudRate::new(baud_rate)
            .ok_or_else(|| PortError::rejected("baud rate must be non-zero"))?;
        let config = PortConfiguration::new(baud);

        let result = self.backend()?.configure(&config);
        self.read_timeout = ReadTimeout::IMMEDIATE;
        match result {
            Ok(()) => {
                self.configuration = Some(config);
                Ok(())
            }
            Err(e) => {
                self.configuration = None;
                Err(e)
            }
        }
    }

    /// Program how long one low-level read waits for the line to go idle.
    ///
    /// Zero makes reads return immediately with whatever is buffered.
    /// Positive values are rounded up to the platform resolution.
    pub fn set_read_timeout(&mut self, timeout_ms: u32) -> Result<(), PortError> {
        let timeout = ReadTimeout::from_millis(timeout_ms);
        if timeout.is_saturated() {
            warn!(
                port = %self.name,
                requested_ms = timeout_ms,
                applied_ms = timeout.quantized_ms(),
                "read timeout exceeds the OS maximum"
            );
        }

        self.backend()?.set_read_timeout(&timeout)?;
        self.read_timeout = timeout;
        Ok(())
    }

    /// The timeout currently programmed into the device.
    pub fn read_timeout(&self) -> ReadTimeout {
        self.read_timeout
    }

    /// Replace the idle-retry policy used by `read`.
    pub fn set_read_policy(&mut self, policy: ReadPolicy) {
        self.read_policy = policy;
    }

    pub fn read_policy(&self) -> ReadPolicy {
        self.read_policy
    }

    /// Worst-case time one `read` call waits on a silent line with the
    /// current timeout and policy.
    pub fn max_read_duration(&self) -> Duration {
        self.read_policy.max_read_duration(&self.read_timeout)
    }

    /// Write `data`, returning how many bytes the OS accepted.
    ///
    /// There is no retry: resubmitting the remainder of a short write is
    /// left to the caller.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, PortError> {
        Ok(self.backend()?.write_chunk(data)?)
    }

    /// Block until all written data has been transmitted.
    pub fn flush(&mut self) -> Result<(), PortError> {
        Ok(self.backend()?.flush()?)
    }

    /// Read up to `max_bytes`. Fewer bytes are returned once the idle-retry
    /// ceiling is reached; that is not an error.
    pub fn read(&mut self, max_bytes: usize) -> Result<Vec<u8>, PortError> {
        let mut buffer = vec![0u8; max_bytes];
        let summary = self.read_into(&mut buffer)?;
        buffer.truncate(summary.bytes_read);
        Ok(buffer)
    }

    /// Fill `buffer` as far as the idle-retry ceiling allows.
    pub fn read_into(&mut self, buffer: &mut [u8]) -> Result<ReadSummary, PortError> {
        let policy = self.read_policy;
        let backend = self.backend()?;
        let summary = read_bounded(buffer, &policy, |chunk| backend.read_chunk(chunk))?;

        if summary.is_short(buffer.len()) {
            debug!(
                port = %self.name,
                requested = buffer.len(),
                received = summary.bytes_read,
                idle_retries = summary.idle_retries,
                "short read"
            );
        }
        Ok(summary)
    }

    /// Release the device. Safe to call any number of times; failures are
    /// logged and otherwise ignored.
    pub fn close(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            if let Err(e) = backend.close() {
                debug!(port = %self.name, error = %e, "error while closing serial port");
            }
        }
        self.configuration = None;
    }
}

impl Drop for SerialPort {
    fn drop(&mut self) {
        self.close();
    }
}

impl io::Write for SerialPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(SerialPort::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(SerialPort::flush(self)?)
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .field("baud_rate", &self.configuration.map(|c| c.baud_rate))
            .field("read_timeout_ms", &self.read_timeout.requested_ms())
            .field("idle_retry_ceiling", &self.read_policy.idle_retry_ceiling())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::mock::MockSerialPort;

    fn mock_port() -> (SerialPort, MockSerialPort) {
        let mock = MockSerialPort::new();
        let port = SerialPort::from_backend("MOCK0", Box::new(mock.clone()));
        (port, mock)
    }

    #[test]
    fn test_configure_records_rate() {
        let (mut port, mock) = mock_port();
        assert!(!port.is_configured());

        port.configure(57600).unwrap();
        assert!(port.is_configured());
        assert_eq!(
            mock.configuration().map(|c| c.baud_rate.bits_per_second()),
            Some(57600)
        );
    }

    #[test]
    fn test_zero_baud_rejected_without_touching_backend() {
        let (mut port, mock) = mock_port();
        assert!(matches!(
            port.configure(0),
            Err(PortError::ConfigurationRejected(_))
        ));
        assert_eq!(mock.configuration(), None);
    }

    #[test]
    fn test_configure_resets_timeout() {
        let (mut port, _mock) = mock_port();
        port.set_read_timeout(300).unwrap();
        port.configure(9600).unwrap();
        assert!(port.read_timeout().is_immediate());
    }

    #[test]
    fn test_rejected_configure_resets_timeout_state() {
        let (mut port, mock) = mock_port();
        port.configure(9600).unwrap();
        port.set_read_timeout(500).unwrap();
        mock.reject_custom_rates(true);

        let result = port.configure(1_000_000);

        assert!(matches!(result, Err(PortError::ConfigurationRejected(_))));
        assert!(mock.timeout().is_immediate());
        assert!(port.read_timeout().is_immediate());
        assert_eq!(port.max_read_duration(), Duration::ZERO);
        assert!(port.configuration().is_none());
        assert!(!port.is_configured());
        assert!(port.is_open());
    }

    #[test]
    fn test_close_releases_backend_once() {
        let (mut port, mock) = mock_port();
        port.close();
        port.close();
        drop(port);
        assert_eq!(mock.closes(), 1);
    }

    #[test]
    fn test_drop_closes() {
        let (port, mock) = mock_port();
        drop(port);
        assert_eq!(mock.closes(), 1);
    }

    #[test]
    fn test_operations_after_close_fail() {
        let (mut port, _mock) = mock_port();
        port.close();

        assert!(matches!(port.configure(9600), Err(PortError::Closed)));
        assert!(matches!(port.set_read_timeout(10), Err(PortError::Closed)));
        assert!(matches!(port.write(b"x"), Err(PortError::Closed)));
        assert!(matches!(port.read(1), Err(PortError::Closed)));
        assert!(matches!(port.flush(), Err(PortError::Closed)));
        assert!(!port.is_configured());
    }

    #[test]
    fn test_io_write_trait() {
        use std::io::Write;

        let (mut port, mock) = mock_port();
        port.write_all(b"AT\r\n").unwrap();
        Write::flush(&mut port).unwrap();
        assert_eq!(mock.written_bytes(), b"AT\r\n");
        assert_eq!(mock.flushes(), 1);
    }

    #[test]
    fn test_max_read_duration_tracks_settings() {
        let (mut port, _mock) = mock_port();
        port.set_read_timeout(100).unwrap();
        port.set_read_policy(ReadPolicy::with_idle_retries(4));
        assert_eq!(port.max_read_duration(), Duration::from_millis(400));
    }
}
