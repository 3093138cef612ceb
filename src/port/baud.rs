//! Baud rate table.
//!
//! Rates in the canonical table map onto the symbolic constants every
//! platform defines. Anything else goes through the backend's custom-rate
//! path, which must confirm the OS actually accepted the value.

use std::fmt;

/// A rate from the canonical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardBaud {
    B1200,
    B2400,
    B4800,
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B230400,
}

impl StandardBaud {
    /// Every canonical rate, slowest first.
    pub const ALL: [StandardBaud; 9] = [
        StandardBaud::B1200,
        StandardBaud::B2400,
        StandardBaud::B4800,
        StandardBaud::B9600,
        StandardBaud::B19200,
        StandardBaud::B38400,
        StandardBaud::B57600,
        StandardBaud::B115200,
        StandardBaud::B230400,
    ];

    /// Bits per second.
    pub const fn bits_per_second(self) -> u32 {
        match self {
            StandardBaud::B1200 => 1200,
            StandardBaud::B2400 => 2400,
            StandardBaud::B4800 => 4800,
            StandardBaud::B9600 => 9600,
            StandardBaud::B19200 => 19200,
            StandardBaud::B38400 => 38400,
            StandardBaud::B57600 => 57600,
            StandardBaud::B115200 => 115200,
            StandardBaud::B230400 => 230400,
        }
    }

    /// Look up a numeric rate in the table.
    pub fn from_bits_per_second(rate: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.bits_per_second() == rate)
    }
}

/// A baud rate as requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaudRate {
    /// A member of the canonical table.
    Standard(StandardBaud),
    /// Any other rate, applied through the custom-rate path.
    Custom(u32),
}

impl BaudRate {
    /// Classify a numeric rate. Zero is never a valid line speed.
    pub fn new(rate: u32) -> Option<Self> {
        if rate == 0 {
            return None;
        }
        Some(
            StandardBaud::from_bits_per_second(rate)
                .map(BaudRate::Standard)
                .unwrap_or(BaudRate::Custom(rate)),
        )
    }

    /// Bits per second.
    pub const fn bits_per_second(self) -> u32 {
        match self {
            BaudRate::Standard(b) => b.bits_per_second(),
            BaudRate::Custom(rate) => rate,
        }
    }

    pub fn is_custom(self) -> bool {
        matches!(self, BaudRate::Custom(_))
    }
}

impl From<StandardBaud> for BaudRate {
    fn from(baud: StandardBaud) -> Self {
        BaudRate::Standard(baud)
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaudRate::Standard(b) => write!(f, "{} baud", b.bits_per_second()),
            BaudRate::Custom(rate) => write!(f, "{rate} baud (custom)"),
        }
    }
}
