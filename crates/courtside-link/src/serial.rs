use std::io;
use std::time::Duration;

use crate::{ChannelError, SerialBackend, SerialLink};

/// Backend for physical serial devices via the `serialport` crate.
#[derive(Clone, Copy, Debug)]
pub struct SerialPortBackend {
    /// Write timeout applied to every opened port.
    pub timeout: Duration,
}

impl Default for SerialPortBackend {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(100),
        }
    }
}

impl SerialBackend for SerialPortBackend {
    fn open(&self, port: &str, baud: u32) -> Result<Box<dyn SerialLink>, ChannelError> {
        let handle = serialport::new(port, baud)
            .timeout(self.timeout)
            .open()
            .map_err(|e| classify(port, baud, e))?;
        log::debug!("opened {port} at {baud} baud");
        Ok(Box::new(handle))
    }
}

fn classify(port: &str, baud: u32, err: serialport::Error) -> ChannelError {
    let port = port.to_owned();
    match err.kind() {
        serialport::ErrorKind::NoDevice | serialport::ErrorKind::Io(io::ErrorKind::NotFound) => {
            ChannelError::NotFound { port }
        }
        serialport::ErrorKind::Io(io::ErrorKind::ResourceBusy) => ChannelError::Busy { port },
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => ChannelError::Handshake {
            port,
            baud,
            reason: format!("permission denied: {}", err.description),
        },
        _ => ChannelError::Handshake {
            port,
            baud,
            reason: err.description,
        },
    }
}
