//! Read timeout policy.
//!
//! POSIX terminals express read timeouts as an inter-character timer in
//! tenths of a second (`VTIME`), while the Windows COMM API uses an interval
//! plus total-timeout counters in milliseconds. Both are derived here from a
//! single millisecond request so the observable behavior is the same: a
//! low-level read returns after the first idle gap of roughly the requested
//! duration, or as soon as the buffer fills.
//!
//! A positive request is always rounded up to the native resolution, so a
//! positive timeout can never turn into a non-blocking read.

use std::time::Duration;

/// Length of one `VTIME` unit.
pub const VTIME_UNIT_MS: u32 = 100;

/// Largest value `VTIME` (a `cc_t`) can hold.
pub const MAX_VTIME: u8 = u8::MAX;

/// `MAXDWORD`, used by the COMM API to mean "return immediately".
pub const COMM_MAXDWORD: u32 = u32::MAX;

/// Idle retries allowed per read call unless configured otherwise.
pub const DEFAULT_IDLE_RETRY_CEILING: u32 = 10;

/// Granularity of the OS timeout primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// termios `VTIME`: tenths of a second, at most 25.5 s.
    Deciseconds,
    /// `COMMTIMEOUTS`: milliseconds.
    Milliseconds,
}

impl Resolution {
    /// The resolution of the platform this crate was built for.
    pub const fn native() -> Self {
        if cfg!(windows) {
            Resolution::Milliseconds
        } else {
            Resolution::Deciseconds
        }
    }

    /// Round `ms` up to this resolution. Zero stays zero; positive values
    /// never quantize to zero.
    pub fn quantize_ms(self, ms: u32) -> u32 {
        if ms == 0 {
            return 0;
        }
        match self {
            Resolution::Deciseconds => {
                let units = ms.div_ceil(VTIME_UNIT_MS).min(u32::from(MAX_VTIME));
                units * VTIME_UNIT_MS
            }
            // The interval field treats MAXDWORD as "no interval timeout".
            Resolution::Milliseconds => ms.min(COMM_MAXDWORD - 1),
        }
    }
}

/// The three read fields of a Windows `COMMTIMEOUTS` structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommTimeouts {
    pub read_interval: u32,
    pub read_total_multiplier: u32,
    pub read_total_constant: u32,
}

impl CommTimeouts {
    /// Return at once with whatever is buffered, possibly nothing.
    pub const IMMEDIATE: CommTimeouts = CommTimeouts {
        read_interval: COMM_MAXDWORD,
        read_total_multiplier: 0,
        read_total_constant: 0,
    };
}

/// A caller-requested read timeout together with the resolution it will be
/// applied at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTimeout {
    requested_ms: u32,
    resolution: Resolution,
}

impl ReadTimeout {
    /// Non-blocking reads at the native resolution.
    pub const IMMEDIATE: ReadTimeout = ReadTimeout {
        requested_ms: 0,
        resolution: Resolution::native(),
    };

    /// A timeout applied at the native resolution.
    pub fn from_millis(ms: u32) -> Self {
        Self::with_resolution(ms, Resolution::native())
    }

    /// A timeout applied at an explicit resolution.
    pub fn with_resolution(ms: u32, resolution: Resolution) -> Self {
        Self {
            requested_ms: ms,
            resolution,
        }
    }

    pub fn requested_ms(&self) -> u32 {
        self.requested_ms
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// True when reads should not wait at all.
    pub fn is_immediate(&self) -> bool {
        self.requested_ms == 0
    }

    /// The timeout actually programmed into the device, in milliseconds.
    pub fn quantized_ms(&self) -> u32 {
        self.resolution.quantize_ms(self.requested_ms)
    }

    /// True when the request exceeded what the OS primitive can express.
    pub fn is_saturated(&self) -> bool {
        self.resolution == Resolution::Deciseconds
            && self.requested_ms > u32::from(MAX_VTIME) * VTIME_UNIT_MS
    }

    /// How long one idle low-level read waits before returning zero bytes.
    pub fn slice(&self) -> Duration {
        Duration::from_millis(u64::from(self.quantized_ms()))
    }

    /// `VTIME` value in tenths of a second, to be paired with `VMIN = 0`.
    pub fn vtime(&self) -> u8 {
        let units = self.resolution.quantize_ms(self.requested_ms).div_ceil(VTIME_UNIT_MS);
        units.min(u32::from(MAX_VTIME)) as u8
    }

    /// Read fields for `SetCommTimeouts`.
    ///
    /// A positive timeout bounds both the gap between characters and the
    /// whole call, so a silent line returns after one slice and a line that
    /// goes quiet mid-transfer returns after one gap.
    pub fn comm_timeouts(&self) -> CommTimeouts {
        if self.is_immediate() {
            return CommTimeouts::IMMEDIATE;
        }
        let ms = Resolution::Milliseconds.quantize_ms(self.requested_ms);
        CommTimeouts {
            read_interval: ms,
            read_total_multiplier: 0,
            read_total_constant: ms,
        }
    }
}

impl Default for ReadTimeout {
    fn default() -> Self {
        Self::IMMEDIATE
    }
}

/// How many idle low-level reads a single `read` call may absorb before it
/// gives up and returns what it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPolicy {
    idle_retry_ceiling: u32,
}

impl ReadPolicy {
    /// A policy allowing `ceiling` idle reads. Zero is treated as one: every
    /// read call issues at least one low-level read.
    pub fn with_idle_retries(ceiling: u32) -> Self {
        Self {
            idle_retry_ceiling: ceiling.max(1),
        }
    }

    pub fn idle_retry_ceiling(&self) -> u32 {
        self.idle_retry_ceiling
    }

    /// Worst-case time a single `read` call spends waiting on a silent line.
    pub fn max_read_duration(&self, timeout: &ReadTimeout) -> Duration {
        timeout.slice() * self.idle_retry_ceiling
    }
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self::with_idle_retries(DEFAULT_IDLE_RETRY_CEILING)
    }
}
