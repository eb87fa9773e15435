use std::io::{ErrorKind, Read};
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{write_fully, SerialLink};

/// Serial port settings. Port name and baud rate are the only protocol
/// relevant settings; the timeout bounds individual blocking reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub timeout: Duration,
}

impl SerialConfig {
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            ..Self::default()
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: 115_200,
            timeout: Duration::from_millis(100),
        }
    }
}

/// [`SerialLink`] over an operating-system serial port.
///
/// The port is configured at construction and only opened by
/// [`SerialLink::open`], so a link can be created before the device is
/// attached.
pub struct SerialPortLink {
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialPortLink {
    pub fn new(config: SerialConfig) -> Self {
        Self { config, port: None }
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| TransportError::NotOpen(self.config.port.clone()))
    }
}

impl SerialLink for SerialPortLink {
    fn name(&self) -> &str {
        &self.config.port
    }

    fn open(&mut self) -> Result<()> {
        if self.config.port.is_empty() {
            return Err(TransportError::Open {
                port: String::new(),
                reason: "port name must not be empty".to_string(),
            });
        }
        if self.config.baud_rate == 0 {
            return Err(TransportError::Open {
                port: self.config.port.clone(),
                reason: "baud rate must be greater than zero".to_string(),
            });
        }

        let port = serialport::new(&self.config.port, self.config.baud_rate)
            .timeout(self.config.timeout)
            .open()
            .map_err(|err| TransportError::Open {
                port: self.config.port.clone(),
                reason: err.to_string(),
            })?;

        info!(port = %self.config.port, baud = self.config.baud_rate, "serial port opened");
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            debug!(port = %self.config.port, "serial port closed");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let port = self.port_mut()?;
        Ok(port.bytes_to_read()? as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let port = self.port_mut()?;
        loop {
            match port.read(buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::TimedOut => return Ok(0),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port_mut()?;
        write_fully(port, data)
    }
}

impl std::fmt::Debug for SerialPortLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortLink")
            .field("config", &self.config)
            .field("open", &self.port.is_some())
            .finish()
    }
}
