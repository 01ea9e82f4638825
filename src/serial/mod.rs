//! Serial device connection and upload port discovery

use serialport::{DataBits, FlowControl, Parity, SerialPort};
use std::io::Write;
use std::time::Duration;

use crate::errors::{BrewError, Result};
use crate::platform;

/// Connection to the device the firmware is uploaded to.
///
/// The upload subprocess needs exclusive access to the port, so the
/// connection is closed for the duration of the Upload phase.
pub trait SerialConnection: Send {
    fn port_name(&self) -> &str;

    fn is_open(&self) -> bool;

    fn open(&mut self) -> Result<()>;

    /// Close the connection; closing a closed connection is a no-op
    fn close(&mut self);

    fn write(&mut self, data: &[u8]) -> Result<usize>;
}

/// [`SerialConnection`] backed by the `serialport` crate
pub struct SerialPortConnection {
    port_name: String,
    baud_rate: u32,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialPortConnection {
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            port: None,
        }
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl SerialConnection for SerialPortConnection {
    fn port_name(&self) -> &str {
        &self.port_name
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn open(&mut self) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }

        let path = platform::device_path(&self.port_name);
        log::debug!("Opening serial port {} at {} baud", path, self.baud_rate);

        let port = serialport::new(&path, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(|e| BrewError::Serial(format!("Failed to open {}: {}", path, e)))?;

        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            log::debug!("Closed serial port {}", self.port_name);
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| BrewError::Serial(format!("{} is not open", self.port_name)))?;
        port.write_all(data)?;
        Ok(data.len())
    }
}

/// Whether a port name looks like an upload-capable USB device
pub fn is_upload_port(port_name: &str) -> bool {
    port_name.contains("ACM") || port_name.contains("USB")
}

/// Bare identifiers of the serial ports a board can be uploaded through
pub fn available_upload_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports()?;

    let names: Vec<String> = ports
        .into_iter()
        .map(|info| platform::bare_port_name(&info.port_name).to_string())
        .filter(|name| is_upload_port(name))
        .collect();

    log::debug!("Found {} upload port(s)", names.len());
    Ok(names)
}
