//! COMM API backend for Windows.
//!
//! Read behavior is driven entirely by `COMMTIMEOUTS`; see
//! `ReadTimeout::comm_timeouts` for how a millisecond request maps onto the
//! interval and total-timeout fields.

use super::baud::BaudRate;
use super::error::PortError;
use super::timeout::{CommTimeouts, ReadTimeout};
use super::traits::{PortConfiguration, SerialBackend};
use std::ffi::OsStr;
use std::io;
use std::mem;
use std::os::windows::ffi::OsStrExt;
use std::ptr;
use tracing::{debug, trace};
use winapi::shared::minwindef::{DWORD, FALSE};
use winapi::um::commapi::{GetCommState, SetCommState, SetCommTimeouts};
use winapi::um::fileapi::{CreateFileW, FlushFileBuffers, ReadFile, WriteFile, OPEN_EXISTING};
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::winbase::{
    COMMTIMEOUTS, DCB, DTR_CONTROL_ENABLE, NOPARITY, ONESTOPBIT, RTS_CONTROL_ENABLE,
};
use winapi::um::winnt::{FILE_ATTRIBUTE_NORMAL, GENERIC_READ, GENERIC_WRITE, HANDLE};

/// An open COM port.
pub struct WindowsSerialPort {
    handle: Option<HANDLE>,
    path: String,
}

// The handle is only ever used through `&mut self`.
unsafe impl Send for WindowsSerialPort {}

impl WindowsSerialPort {
    /// Open `path`, which must already be in `\\.\COMn` form.
    pub fn open(path: &str) -> Result<Self, PortError> {
        let wide: Vec<u16> = OsStr::new(path).encode_wide().chain(Some(0)).collect();

        let handle = unsafe {
            CreateFileW(
                wide.as_ptr(),
                GENERIC_READ | GENERIC_WRITE,
                0,
                ptr::null_mut(),
                OPEN_EXISTING,
                FILE_ATTRIBUTE_NORMAL,
                ptr::null_mut(),
            )
        };
        if handle.is_null() || handle == INVALID_HANDLE_VALUE {
            return Err(PortError::from_open_error(path, io::Error::last_os_error()));
        }

        Ok(Self {
            handle: Some(handle),
            path: path.to_string(),
        })
    }

    fn handle(&self) -> io::Result<HANDLE> {
        self.handle
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "handle released"))
    }

    fn comm_state(&self) -> Result<DCB, PortError> {
        let handle = self.handle()?;
        let mut dcb: DCB = unsafe { mem::zeroed() };
        dcb.DCBlength = mem::size_of::<DCB>() as DWORD;
        if unsafe { GetCommState(handle, &mut dcb) } == FALSE {
            return Err(PortError::rejected_by_os("GetCommState", io::Error::last_os_error()));
        }
        Ok(dcb)
    }

    fn apply_timeouts(&self, timeouts: CommTimeouts) -> Result<(), PortError> {
        let handle = self.handle()?;
        let mut raw = COMMTIMEOUTS {
            ReadIntervalTimeout: timeouts.read_interval,
            ReadTotalTimeoutMultiplier: timeouts.read_total_multiplier,
            ReadTotalTimeoutConstant: timeouts.read_total_constant,
            WriteTotalTimeoutMultiplier: 0,
            WriteTotalTimeoutConstant: 0,
        };
        if unsafe { SetCommTimeouts(handle, &mut raw) } == FALSE {
            return Err(PortError::rejected_by_os("SetCommTimeouts", io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl SerialBackend for WindowsSerialPort {
    fn configure(&mut self, config: &PortConfiguration) -> Result<(), PortError> {
        // Reads go immediate first so a failed configure leaves them that way.
        self.apply_timeouts(CommTimeouts::IMMEDIATE)?;

        let handle = self.handle()?;
        let mut dcb = self.comm_state()?;

        // CBR_* constants equal their numeric rate, so both table hits and
        // custom rates are written the same way; only the read-back differs
        // in what it can catch.
        let rate = config.baud_rate.bits_per_second();
        dcb.BaudRate = rate;
        dcb.ByteSize = 8;
        dcb.Parity = NOPARITY as u8;
        dcb.StopBits = ONESTOPBIT as u8;
        dcb.set_fBinary(1);
        dcb.set_fParity(0);
        dcb.set_fOutxCtsFlow(0);
        dcb.set_fOutxDsrFlow(0);
        dcb.set_fDsrSensitivity(0);
        dcb.set_fOutX(0);
        dcb.set_fInX(0);
        dcb.set_fErrorChar(0);
        dcb.set_fNull(0);
        dcb.set_fAbortOnError(0);
        dcb.set_fDtrControl(DTR_CONTROL_ENABLE);
        dcb.set_fRtsControl(RTS_CONTROL_ENABLE);

        if unsafe { SetCommState(handle, &mut dcb) } == FALSE {
            return Err(PortError::rejected_by_os("SetCommState", io::Error::last_os_error()));
        }

        if let BaudRate::Custom(_) = config.baud_rate {
            let applied = self.comm_state()?;
            if applied.BaudRate != rate {
                return Err(PortError::rejected(format!(
                    "driver set {} baud instead of {rate}",
                    applied.BaudRate
                )));
            }
        }

        trace!(port = %self.path, baud = %config.baud_rate, "configured 8N1 raw");
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: &ReadTimeout) -> Result<(), PortError> {
        self.apply_timeouts(timeout.comm_timeouts())
    }

    fn read_chunk(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let handle = self.handle()?;
        let len = buffer.len().min(DWORD::MAX as usize) as DWORD;
        let mut read: DWORD = 0;
        let ok = unsafe {
            ReadFile(
                handle,
                buffer.as_mut_ptr().cast(),
                len,
                &mut read,
                ptr::null_mut(),
            )
        };
        if ok == FALSE {
            return Err(io::Error::last_os_error());
        }
        Ok(read as usize)
    }

    fn write_chunk(&mut self, data: &[u8]) -> io::Result<usize> {
        let handle = self.handle()?;
        let len = data.len().min(DWORD::MAX as usize) as DWORD;
        let mut written: DWORD = 0;
        let ok = unsafe {
            WriteFile(
                handle,
                data.as_ptr().cast(),
                len,
                &mut written,
                ptr::null_mut(),
            )
        };
        if ok == FALSE {
            return Err(io::Error::last_os_error());
        }
        Ok(written as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        let handle = self.handle()?;
        if unsafe { FlushFileBuffers(handle) } == FALSE {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        match self.handle.take() {
            Some(handle) => {
                if unsafe { CloseHandle(handle) } == FALSE {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for WindowsSerialPort {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            debug!(port = %self.path, error = %e, "close on drop failed");
        }
    }
}

impl std::fmt::Debug for WindowsSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowsSerialPort")
            .field("path", &self.path)
            .field("open", &self.handle.is_some())
            .finish()
    }
}
