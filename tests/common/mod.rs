//! Shared test utilities for serial_link tests.
//!
//! This module provides common test infrastructure including:
//! - Mock port creation with pre-programmed receive data
//! - A pseudo-terminal pair for exercising the native Unix backend
//! - Timing assertions for bounded reads

#![allow(dead_code)]

use serial_link::port::{MockSerialPort, SerialPort};
use std::time::Duration;

/// Create a handle over a fresh mock, returning the handle and an inspection clone.
///
/// # Example
/// ```ignore
/// let (mut port, mock) = mock_port("MOCK0");
/// mock.enqueue_read(b"OK\r\n");
/// ```
pub fn mock_port(port_name: &str) -> (SerialPort, MockSerialPort) {
    serial_link::logging::init_for_tests();
    let mock = MockSerialPort::new();
    let port = SerialPort::from_backend(port_name, Box::new(mock.clone()));
    (port, mock)
}

/// Create a configured mock handle whose receive queue holds each response in order.
pub fn create_mock_port_with_responses(
    port_name: &str,
    baud_rate: u32,
    responses: Vec<&[u8]>,
) -> (SerialPort, MockSerialPort) {
    let (mut port, mock) = mock_port(port_name);
    port.configure(baud_rate).expect("mock accepts every rate");
    for response in responses {
        mock.enqueue_read(response);
    }
    (port, mock)
}

/// Assert `actual` lies within `tolerance` (a fraction) of `expected`.
pub fn assert_duration_near(actual: Duration, expected: Duration, tolerance: f64) {
    let expected_secs = expected.as_secs_f64();
    let low = expected_secs * (1.0 - tolerance);
    let high = expected_secs * (1.0 + tolerance);
    let actual_secs = actual.as_secs_f64();
    assert!(
        actual_secs >= low && actual_secs <= high,
        "expected {:?} +/- {:.0}%, got {:?}",
        expected,
        tolerance * 100.0,
        actual
    );
}

/// Test data patterns for bulk transfers.
pub mod test_data {
    /// Bytes `0..len` wrapping at 256.
    pub fn ramp(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 256) as u8).collect()
    }

    /// A bootloader ping packet as sent over UART.
    pub const PING: &[u8] = &[0x5a, 0xa6];

    /// The matching ping response.
    pub const PING_RESPONSE: &[u8] = &[0x5a, 0xa7, 0x00, 0x02, 0x01, 0x50, 0x00, 0x00, 0xaa, 0xea];
}

/// A pseudo-terminal pair. The slave side is what `SerialPort::open` sees;
/// the master side plays the remote device.
///
/// A second descriptor on the slave is opened up front, before the port
/// under test claims exclusive access, so its line settings can be read back.
#[cfg(unix)]
pub struct Pty {
    master: std::fs::File,
    slave_observer: std::fs::File,
    slave_path: String,
}

#[cfg(unix)]
impl Pty {
    /// Allocate a new pty, or `None` if the system has none available.
    pub fn open() -> Option<Self> {
        use std::ffi::CStr;
        use std::os::unix::io::FromRawFd;

        unsafe {
            let fd = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
            if fd < 0 {
                return None;
            }
            if libc::grantpt(fd) != 0 || libc::unlockpt(fd) != 0 {
                libc::close(fd);
                return None;
            }
            let name = libc::ptsname(fd);
            if name.is_null() {
                libc::close(fd);
                return None;
            }
            let slave_path = CStr::from_ptr(name).to_string_lossy().into_owned();
            let master = std::fs::File::from_raw_fd(fd);

            let c_path = std::ffi::CString::new(slave_path.clone()).ok()?;
            let observer = libc::open(c_path.as_ptr(), libc::O_RDWR | libc::O_NOCTTY);
            if observer < 0 {
                return None;
            }
            Some(Self {
                master,
                slave_observer: std::fs::File::from_raw_fd(observer),
                slave_path,
            })
        }
    }

    pub fn slave_path(&self) -> &str {
        &self.slave_path
    }

    /// The slave's current termios, as programmed by the port under test.
    pub fn slave_termios(&self) -> libc::termios {
        use std::os::unix::io::AsRawFd;

        let mut tty = std::mem::MaybeUninit::<libc::termios>::uninit();
        let rc = unsafe { libc::tcgetattr(self.slave_observer.as_raw_fd(), tty.as_mut_ptr()) };
        assert_eq!(rc, 0, "tcgetattr on pty slave: {}", std::io::Error::last_os_error());
        unsafe { tty.assume_init() }
    }

    /// Send bytes toward the port under test.
    pub fn send(&mut self, data: &[u8]) {
        use std::io::Write;
        self.master.write_all(data).expect("write to pty master");
        self.master.flush().expect("flush pty master");
    }

    /// Receive exactly `len` bytes written by the port under test.
    pub fn receive(&mut self, len: usize) -> Vec<u8> {
        use std::io::Read;
        let mut buffer = vec![0u8; len];
        self.master
            .read_exact(&mut buffer)
            .expect("read from pty master");
        buffer
    }
}
