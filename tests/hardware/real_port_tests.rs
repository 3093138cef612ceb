//! Tests requiring actual serial hardware.
//!
//! These tests are skipped if no hardware is available.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! # Set environment variables
//! export TEST_PORT=COM3                  # or /dev/ttyUSB0 on Linux
//! export TEST_BAUD=115200                # optional, default: 115200
//! export TEST_LOOPBACK=1                 # if port has TX-RX loopback
//!
//! # Run tests
//! cargo test --features hardware-tests -- --ignored
//! ```
//!
//! # Hardware Requirements
//!
//! - **Real port tests**: Any available serial port
//! - **Loopback tests**: Port with TX and RX connected together

use super::utils::{assert_duration_within, print_available_ports, TimingHelper};
use crate::skip_without_hardware;
use serial_link::port::{PortError, ReadPolicy, SerialPort, StandardBaud};
use std::time::Duration;

#[test]
#[ignore] // Run with --ignored flag
fn test_real_port_open_configure_close() {
    let mut fixture = skip_without_hardware!();
    println!("Testing port: {}", fixture.port_name());

    assert!(fixture.port.is_configured());
    fixture.port.close();
    fixture.port.close();
    assert!(matches!(fixture.port.write(b"x"), Err(PortError::Closed)));
}

#[test]
#[ignore]
fn test_real_port_canonical_rates() {
    let mut fixture = skip_without_hardware!();

    for standard in StandardBaud::ALL {
        fixture
            .port
            .configure(standard.bits_per_second())
            .unwrap_or_else(|e| panic!("{} rejected: {}", standard.bits_per_second(), e));
    }
}

#[test]
#[ignore]
fn test_real_port_custom_rate() {
    let mut fixture = skip_without_hardware!();

    match fixture.port.configure(250_000) {
        Ok(()) => println!("250000 baud accepted"),
        Err(PortError::ConfigurationRejected(msg)) => println!("250000 baud rejected: {msg}"),
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
#[ignore]
fn test_real_port_silent_read_is_bounded() {
    let mut fixture = skip_without_hardware!();
    if fixture.is_loopback() {
        println!("Skipping: needs a silent line, loopback is wired");
        return;
    }
    fixture.drain();

    fixture.port.set_read_timeout(100).expect("set timeout");
    fixture.port.set_read_policy(ReadPolicy::with_idle_retries(5));
    let bound = fixture.port.max_read_duration();

    let timer = TimingHelper::new("silent read");
    let data = fixture.port.read(64).expect("read");
    let elapsed = timer.finish();

    assert!(data.is_empty());
    assert_duration_within(elapsed, bound, Duration::from_millis(150), "silent read");
}

#[test]
#[ignore]
fn test_real_port_loopback_communication() {
    let mut fixture = skip_without_hardware!();
    if !fixture.is_loopback() {
        println!("Skipping loopback test: TEST_LOOPBACK not set to 1");
        return;
    }
    fixture.drain();

    let test_data = b"LOOPBACK TEST\r\n";
    fixture.port.set_read_timeout(200).expect("set timeout");

    let written = fixture.port.write(test_data).expect("write");
    assert_eq!(written, test_data.len());
    fixture.port.flush().expect("flush");

    let echoed = fixture.port.read(test_data.len()).expect("read");
    assert_eq!(echoed, test_data, "Loopback data should match written data");
}

#[test]
#[ignore]
fn test_list_ports() {
    print_available_ports();
}

#[test]
#[ignore]
fn test_open_nonexistent_port() {
    let name = if cfg!(windows) {
        "COM250"
    } else {
        "/dev/ttyNONEXISTENT0"
    };
    assert!(matches!(
        SerialPort::open(name),
        Err(PortError::NotFound(_))
    ));
}
