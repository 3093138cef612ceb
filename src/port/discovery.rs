//! Serial port enumeration.
//!
//! Thin mapping over `serialport::available_ports` so callers get names that
//! can be passed straight to `SerialPort::open`.

use super::error::PortError;
use serialport::SerialPortType;

/// One port reported by the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Device name, usable with `SerialPort::open`.
    pub name: String,
    pub kind: PortKind,
}

/// How the port is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortKind {
    Usb {
        vid: u16,
        pid: u16,
        manufacturer: Option<String>,
        product: Option<String>,
        serial_number: Option<String>,
    },
    Pci,
    Bluetooth,
    Unknown,
}

impl PortInfo {
    pub fn is_usb(&self) -> bool {
        matches!(self.kind, PortKind::Usb { .. })
    }
}

impl From<serialport::SerialPortInfo> for PortInfo {
    fn from(info: serialport::SerialPortInfo) -> Self {
        let kind = match info.port_type {
            SerialPortType::UsbPort(usb) => PortKind::Usb {
                vid: usb.vid,
                pid: usb.pid,
                manufacturer: usb.manufacturer,
                product: usb.product,
                serial_number: usb.serial_number,
            },
            SerialPortType::PciPort => PortKind::Pci,
            SerialPortType::BluetoothPort => PortKind::Bluetooth,
            SerialPortType::Unknown => PortKind::Unknown,
        };
        Self {
            name: info.port_name,
            kind,
        }
    }
}

/// List the serial ports currently present, sorted by name.
pub fn available_ports() -> Result<Vec<PortInfo>, PortError> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()?
        .into_iter()
        .map(PortInfo::from)
        .collect();
    ports.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(ports)
}
