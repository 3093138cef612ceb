//! termios backend for Unix-like systems.
//!
//! Reads are governed by `VMIN = 0` and `VTIME`: a read returns as soon as
//! any byte is available, or with zero bytes once `VTIME` tenths of a second
//! pass without input.

use super::baud::{BaudRate, StandardBaud};
use super::error::PortError;
use super::timeout::ReadTimeout;
use super::traits::{PortConfiguration, SerialBackend};
use std::ffi::CString;
use std::io;
use std::mem::MaybeUninit;
use std::os::unix::io::RawFd;
use tracing::{debug, trace};

#[cfg(any(target_os = "macos", target_os = "ios"))]
const IOSSIOSPEED: libc::c_ulong = 0x8008_5402;

#[cfg(any(target_os = "macos", target_os = "ios"))]
const IOSSDATALAT: libc::c_ulong = 0x8008_5400;

/// An open terminal device.
pub struct PosixSerialPort {
    fd: Option<RawFd>,
    path: String,
}

impl PosixSerialPort {
    /// Open `path` read/write without making it the controlling terminal.
    ///
    /// The descriptor is opened non-blocking so the call cannot hang waiting
    /// for carrier detect, then switched back to blocking so `VTIME` applies.
    pub fn open(path: &str) -> Result<Self, PortError> {
        let c_path = CString::new(path).map_err(|_| PortError::not_found(path))?;

        let fd = unsafe {
            libc::open(
                c_path.as_ptr(),
                libc::O_RDWR | libc::O_NOCTTY | libc::O_NONBLOCK | libc::O_CLOEXEC,
            )
        };
        if fd < 0 {
            return Err(PortError::from_open_error(path, io::Error::last_os_error()));
        }

        // From here on `Drop` releases the descriptor on any early return.
        let port = Self {
            fd: Some(fd),
            path: path.to_string(),
        };

        let flags = cvt(unsafe { libc::fcntl(fd, libc::F_GETFL) })?;
        cvt(unsafe { libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) })?;

        if unsafe { libc::ioctl(fd, libc::TIOCEXCL as _) } < 0 {
            debug!(
                port = %path,
                error = %io::Error::last_os_error(),
                "exclusive mode unavailable"
            );
        }

        Ok(port)
    }

    fn fd(&self) -> io::Result<RawFd> {
        self.fd
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "descriptor released"))
    }

    fn get_attrs(&self) -> Result<libc::termios, PortError> {
        let fd = self.fd()?;
        let mut tty = MaybeUninit::<libc::termios>::uninit();
        if unsafe { libc::tcgetattr(fd, tty.as_mut_ptr()) } < 0 {
            return Err(PortError::rejected_by_os("tcgetattr", io::Error::last_os_error()));
        }
        Ok(unsafe { tty.assume_init() })
    }

    fn set_attrs(&self, tty: &libc::termios, action: libc::c_int) -> Result<(), PortError> {
        let fd = self.fd()?;
        if unsafe { libc::tcsetattr(fd, action, tty) } < 0 {
            return Err(PortError::rejected_by_os("tcsetattr", io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl SerialBackend for PosixSerialPort {
    fn configure(&mut self, config: &PortConfiguration) -> Result<(), PortError> {
        let mut tty = self.get_attrs()?;

        unsafe { libc::cfmakeraw(&mut tty) };
        tty.c_cflag &= !(libc::PARENB | libc::CSTOPB | libc::CSIZE);
        tty.c_cflag |= libc::CS8 | libc::CLOCAL | libc::CREAD;
        tty.c_iflag &= !(libc::IXON | libc::IXOFF | libc::IXANY);
        tty.c_oflag = 0;
        tty.c_lflag = 0;
        tty.c_cc[libc::VMIN] = 0;
        tty.c_cc[libc::VTIME] = 0;

        if let BaudRate::Standard(baud) = config.baud_rate {
            let speed = standard_speed(baud);
            if unsafe { libc::cfsetospeed(&mut tty, speed) } < 0 {
                return Err(PortError::rejected_by_os("cfsetospeed", io::Error::last_os_error()));
            }
            if unsafe { libc::cfsetispeed(&mut tty, speed) } < 0 {
                return Err(PortError::rejected_by_os("cfsetispeed", io::Error::last_os_error()));
            }
        }

        self.set_attrs(&tty, libc::TCSAFLUSH)?;

        if let BaudRate::Custom(rate) = config.baud_rate {
            apply_custom_rate(self.fd()?, rate)?;
        }

        trace!(port = %self.path, baud = %config.baud_rate, "configured 8N1 raw");
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: &ReadTimeout) -> Result<(), PortError> {
        let mut tty = self.get_attrs()?;
        tty.c_cc[libc::VMIN] = 0;
        tty.c_cc[libc::VTIME] = timeout.vtime();
        // TCSANOW: input that already arrived must survive a timeout change.
        self.set_attrs(&tty, libc::TCSANOW)?;

        #[cfg(any(target_os = "macos", target_os = "ios"))]
        set_receive_latency(self.fd()?);

        Ok(())
    }

    fn read_chunk(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let fd = self.fd()?;
        loop {
            let n = unsafe { libc::read(fd, buffer.as_mut_ptr().cast(), buffer.len()) };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::Interrupted => continue,
                io::ErrorKind::WouldBlock => return Ok(0),
                _ => return Err(err),
            }
        }
    }

    fn write_chunk(&mut self, data: &[u8]) -> io::Result<usize> {
        let fd = self.fd()?;
        loop {
            let n = unsafe { libc::write(fd, data.as_ptr().cast(), data.len()) };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let fd = self.fd()?;
        loop {
            match cvt(unsafe { libc::tcdrain(fd) }) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other.map(|_| ()),
            }
        }
    }

    fn close(&mut self) -> io::Result<()> {
        match self.fd.take() {
            Some(fd) => cvt(unsafe { libc::close(fd) }).map(|_| ()),
            None => Ok(()),
        }
    }
}

impl Drop for PosixSerialPort {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            debug!(port = %self.path, error = %e, "close on drop failed");
        }
    }
}

impl std::fmt::Debug for PosixSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosixSerialPort")
            .field("path", &self.path)
            .field("fd", &self.fd)
            .finish()
    }
}

fn cvt(ret: libc::c_int) -> io::Result<libc::c_int> {
    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret)
    }
}

fn standard_speed(baud: StandardBaud) -> libc::speed_t {
    match baud {
        StandardBaud::B1200 => libc::B1200,
        StandardBaud::B2400 => libc::B2400,
        StandardBaud::B4800 => libc::B4800,
        StandardBaud::B9600 => libc::B9600,
        StandardBaud::B19200 => libc::B19200,
        StandardBaud::B38400 => libc::B38400,
        StandardBaud::B57600 => libc::B57600,
        StandardBaud::B115200 => libc::B115200,
        StandardBaud::B230400 => libc::B230400,
    }
}

/// Linux encodes arbitrary rates with `BOTHER` in the extended `termios2`
/// structure. The rate is read back because drivers may round or refuse it.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn apply_custom_rate(fd: RawFd, rate: u32) -> Result<(), PortError> {
    let mut tio = MaybeUninit::<libc::termios2>::uninit();
    if unsafe { libc::ioctl(fd, libc::TCGETS2, tio.as_mut_ptr()) } < 0 {
        return Err(PortError::rejected_by_os("TCGETS2", io::Error::last_os_error()));
    }
    let mut tio = unsafe { tio.assume_init() };

    tio.c_cflag &= !libc::CBAUD;
    tio.c_cflag |= libc::BOTHER;
    tio.c_ispeed = rate;
    tio.c_ospeed = rate;
    if unsafe { libc::ioctl(fd, libc::TCSETS2, &tio) } < 0 {
        return Err(PortError::rejected_by_os("TCSETS2", io::Error::last_os_error()));
    }

    let mut check = MaybeUninit::<libc::termios2>::uninit();
    if unsafe { libc::ioctl(fd, libc::TCGETS2, check.as_mut_ptr()) } < 0 {
        return Err(PortError::rejected_by_os("TCGETS2", io::Error::last_os_error()));
    }
    let check = unsafe { check.assume_init() };
    if check.c_ospeed != rate {
        return Err(PortError::rejected(format!(
            "driver set {} baud instead of {rate}",
            check.c_ospeed
        )));
    }
    Ok(())
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
fn apply_custom_rate(fd: RawFd, rate: u32) -> Result<(), PortError> {
    let speed = rate as libc::speed_t;
    if unsafe { libc::ioctl(fd, IOSSIOSPEED, &speed) } < 0 {
        return Err(PortError::rejected_by_os("IOSSIOSPEED", io::Error::last_os_error()));
    }
    Ok(())
}

/// On the BSD family `speed_t` is the numeric rate, so plain termios can
/// carry it; the read-back catches drivers that silently clamp.
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios"
)))]
fn apply_custom_rate(fd: RawFd, rate: u32) -> Result<(), PortError> {
    let speed = rate as libc::speed_t;
    let mut tty = MaybeUninit::<libc::termios>::uninit();
    if unsafe { libc::tcgetattr(fd, tty.as_mut_ptr()) } < 0 {
        return Err(PortError::rejected_by_os("tcgetattr", io::Error::last_os_error()));
    }
    let mut tty = unsafe { tty.assume_init() };
    if unsafe { libc::cfsetspeed(&mut tty, speed) } < 0 {
        return Err(PortError::rejected_by_os("cfsetspeed", io::Error::last_os_error()));
    }
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tty) } < 0 {
        return Err(PortError::rejected_by_os("tcsetattr", io::Error::last_os_error()));
    }
    if unsafe { libc::tcgetattr(fd, &mut tty) } < 0 {
        return Err(PortError::rejected_by_os("tcgetattr", io::Error::last_os_error()));
    }
    let actual = unsafe { libc::cfgetospeed(&tty) };
    if actual != speed {
        return Err(PortError::rejected(format!(
            "driver set {actual} baud instead of {rate}"
        )));
    }
    Ok(())
}

/// Ask the driver to hand received bytes over after 1 µs instead of
/// batching them. Failure only costs latency.
#[cfg(any(target_os = "macos", target_os = "ios"))]
fn set_receive_latency(fd: RawFd) {
    let micros: libc::c_ulong = 1;
    if unsafe { libc::ioctl(fd, IOSSDATALAT, &micros) } < 0 {
        debug!(error = %io::Error::last_os_error(), "IOSSDATALAT not supported");
    }
}
