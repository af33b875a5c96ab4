pub mod link;

pub use link::{DataLink, LinkSettings, SerialLink};

use serde::{Deserialize, Serialize};
use serialport::SerialPortType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialDeviceInfo {
    pub port_name: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Communication timeout")]
    Timeout,

    #[error("Link closed")]
    Closed,

    #[error("Short read: {got} of {wanted} bytes")]
    ShortRead { wanted: usize, got: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialport error: {0}")]
    SerialportError(#[from] serialport::Error),
}

pub type Result<T> = std::result::Result<T, SerialError>;

/// List serial ports that could host the instrument.
///
/// The instrument enumerates as a plain CDC serial device, so no
/// VID/PID filtering is applied; callers present the list and let the
/// operator pick.
pub fn available_ports() -> Result<Vec<SerialDeviceInfo>> {
    let ports = serialport::available_ports()?;
    let mut devices = Vec::new();

    for port in ports {
        let device = match port.port_type {
            SerialPortType::UsbPort(usb_info) => SerialDeviceInfo {
                port_name: port.port_name,
                vid: Some(usb_info.vid),
                pid: Some(usb_info.pid),
                serial_number: usb_info.serial_number,
                manufacturer: usb_info.manufacturer,
                product: usb_info.product,
            },
            _ => SerialDeviceInfo {
                port_name: port.port_name,
                vid: None,
                pid: None,
                serial_number: None,
                manufacturer: None,
                product: None,
            },
        };
        devices.push(device);
    }

    Ok(devices)
}
