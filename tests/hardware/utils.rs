//! Utility functions for hardware testing.
//!
//! Provides helpers for port discovery, test setup/teardown, and timing utilities.

use serial_link::config::ConfigLoader;
use serial_link::port::{available_ports, PortInfo, PortKind, SerialPort};
use std::time::{Duration, Instant};

/// Test port configuration from the `[testing]` section and its env overrides.
pub struct TestPortConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub loopback_enabled: bool,
}

impl TestPortConfig {
    /// Read `TEST_PORT`, `TEST_BAUD` and `TEST_LOOPBACK` through the config loader.
    pub fn from_env() -> Option<Self> {
        let testing = ConfigLoader::with_defaults().into_config().testing;
        Some(TestPortConfig {
            port_name: testing.port?,
            baud_rate: testing.baud,
            loopback_enabled: testing.loopback_enabled,
        })
    }
}

/// Discover all available serial ports on the system.
pub fn discover_available_ports() -> Vec<PortInfo> {
    available_ports().unwrap_or_default()
}

/// Print available ports for debugging.
pub fn print_available_ports() {
    let ports = discover_available_ports();

    if ports.is_empty() {
        println!("No serial ports detected on this system");
        return;
    }

    println!("Available serial ports ({}):", ports.len());
    for (idx, port) in ports.iter().enumerate() {
        println!("  {}. {}", idx + 1, port.name);

        match &port.kind {
            PortKind::Usb {
                vid,
                pid,
                manufacturer,
                product,
                ..
            } => {
                println!("     Type: USB");
                println!("     VID:PID = {:04x}:{:04x}", vid, pid);
                if let Some(manufacturer) = manufacturer {
                    println!("     Manufacturer: {}", manufacturer);
                }
                if let Some(product) = product {
                    println!("     Product: {}", product);
                }
            }
            PortKind::Bluetooth => println!("     Type: Bluetooth"),
            PortKind::Pci => println!("     Type: PCI"),
            PortKind::Unknown => println!("     Type: Unknown"),
        }
    }
}

/// Timing helper for measuring operation duration.
pub struct TimingHelper {
    start: Instant,
    name: String,
}

impl TimingHelper {
    pub fn new(name: &str) -> Self {
        println!("Starting: {}", name);
        TimingHelper {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        println!("Completed: {} in {:?}", self.name, elapsed);
        elapsed
    }
}

/// Test fixture for serial port testing.
pub struct PortTestFixture {
    pub port: SerialPort,
    config: TestPortConfig,
}

impl PortTestFixture {
    /// Open and configure the port named by the environment.
    pub fn setup() -> Option<Self> {
        let config = TestPortConfig::from_env()?;

        println!(
            "Setting up test fixture for {} at {} baud",
            config.port_name, config.baud_rate
        );

        let mut port = match SerialPort::open(&config.port_name) {
            Ok(p) => p,
            Err(e) => {
                println!("Failed to open port: {}", e);
                return None;
            }
        };
        if let Err(e) = port.configure(config.baud_rate) {
            println!("Failed to configure port: {}", e);
            return None;
        }

        Some(PortTestFixture { port, config })
    }

    /// Check if loopback is enabled.
    pub fn is_loopback(&self) -> bool {
        self.config.loopback_enabled
    }

    pub fn port_name(&self) -> &str {
        &self.config.port_name
    }

    /// Read with a zero timeout until the line is empty.
    pub fn drain(&mut self) {
        if self.port.set_read_timeout(0).is_ok() {
            while matches!(self.port.read(256), Ok(data) if !data.is_empty()) {}
        }
    }
}

/// Skip test with a clear message if hardware is not available.
#[macro_export]
macro_rules! skip_without_hardware {
    () => {
        match $crate::hardware::utils::PortTestFixture::setup() {
            Some(fixture) => fixture,
            None => {
                println!("Skipping: TEST_PORT not set or port unavailable");
                println!("   Set TEST_PORT=COM3 (or /dev/ttyUSB0) to run hardware tests");
                return;
            }
        }
    };
}

/// Assert that duration is within expected range.
pub fn assert_duration_within(
    actual: Duration,
    expected: Duration,
    tolerance: Duration,
    message: &str,
) {
    let lower = expected.saturating_sub(tolerance);
    let upper = expected + tolerance;

    assert!(
        actual >= lower && actual <= upper,
        "{}: expected {:?} +/- {:?}, got {:?}",
        message,
        expected,
        tolerance,
        actual
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_helper() {
        let timer = TimingHelper::new("test operation");
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = timer.finish();
        assert!(elapsed >= Duration::from_millis(10));
    }

    #[test]
    #[should_panic]
    fn test_assert_duration_out_of_range() {
        assert_duration_within(
            Duration::from_millis(200),
            Duration::from_millis(100),
            Duration::from_millis(10),
            "should panic",
        );
    }
}
