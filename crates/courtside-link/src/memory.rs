//! In-process serial backend.

use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{ChannelError, SerialBackend, SerialLink};

#[derive(Default)]
struct PortState {
    claimed: bool,
    fail_open: Option<String>,
    fail_writes: bool,
    written: Vec<u8>,
}

type Ports = Arc<Mutex<BTreeMap<String, PortState>>>;

/// Named in-memory ports that record everything written to them.
///
/// Ports are exclusive like real devices: a second open of a claimed port
/// fails with [`ChannelError::Busy`] until the first link is dropped.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    ports: Ports,
    attempts: Arc<AtomicUsize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(self, name: &str) -> Self {
        self.add_port(name);
        self
    }

    pub fn add_port(&self, name: &str) {
        self.ports.lock().entry(name.to_owned()).or_default();
    }

    pub fn remove_port(&self, name: &str) {
        self.ports.lock().remove(name);
    }

    /// Make every open of `name` fail the handshake with `reason`.
    pub fn set_open_failure(&self, name: &str, reason: Option<&str>) {
        if let Some(port) = self.ports.lock().get_mut(name) {
            port.fail_open = reason.map(str::to_owned);
        }
    }

    pub fn set_write_failure(&self, name: &str, fail: bool) {
        if let Some(port) = self.ports.lock().get_mut(name) {
            port.fail_writes = fail;
        }
    }

    pub fn is_claimed(&self, name: &str) -> bool {
        self.ports
            .lock()
            .get(name)
            .map(|p| p.claimed)
            .unwrap_or(false)
    }

    /// Everything written to `name` so far.
    pub fn written(&self, name: &str) -> Vec<u8> {
        self.ports
            .lock()
            .get(name)
            .map(|p| p.written.clone())
            .unwrap_or_default()
    }

    /// Drain what has been written to `name`.
    pub fn take_written(&self, name: &str) -> Vec<u8> {
        self.ports
            .lock()
            .get_mut(name)
            .map(|p| std::mem::take(&mut p.written))
            .unwrap_or_default()
    }

    pub fn open_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl SerialBackend for MemoryBackend {
    fn open(&self, port: &str, baud: u32) -> Result<Box<dyn SerialLink>, ChannelError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let mut ports = self.ports.lock();
        let state = ports.get_mut(port).ok_or_else(|| ChannelError::NotFound {
            port: port.to_owned(),
        })?;
        if let Some(reason) = &state.fail_open {
            return Err(ChannelError::Handshake {
                port: port.to_owned(),
                baud,
                reason: reason.clone(),
            });
        }
        if state.claimed {
            return Err(ChannelError::Busy {
                port: port.to_owned(),
            });
        }
        state.claimed = true;
        Ok(Box::new(MemoryLink {
            name: port.to_owned(),
            ports: self.ports.clone(),
        }))
    }
}

struct MemoryLink {
    name: String,
    ports: Ports,
}

impl io::Write for MemoryLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut ports = self.ports.lock();
        let Some(port) = ports.get_mut(&self.name) else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "port removed"));
        };
        if port.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "write failure"));
        }
        port.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MemoryLink {
    fn drop(&mut self) {
        if let Some(port) = self.ports.lock().get_mut(&self.name) {
            port.claimed = false;
        }
    }
}
