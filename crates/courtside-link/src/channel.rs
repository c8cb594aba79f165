use std::fmt;
use std::io::Write;

use courtside_core::{Camp, Pose, VehicleConfig};

use crate::{encode_pose, ChannelError, SerialBackend, SerialLink};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    Closed,
    Open,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Closed => f.write_str("closed"),
            ChannelState::Open => f.write_str("open"),
        }
    }
}

/// Serial connection to one camp's vehicle.
pub struct VehicleChannel {
    camp: Camp,
    port: String,
    baud: u32,
    link: Option<Box<dyn SerialLink>>,
}

impl VehicleChannel {
    /// A closed channel with no port bound.
    pub fn new(camp: Camp) -> Self {
        Self {
            camp,
            port: String::new(),
            baud: 0,
            link: None,
        }
    }

    /// Build and open a channel from a vehicle configuration.
    pub fn connect(
        camp: Camp,
        backend: &dyn SerialBackend,
        cfg: &VehicleConfig,
    ) -> Result<Self, ChannelError> {
        let mut channel = Self::new(camp);
        channel.open(backend, &cfg.serial_port, cfg.baud_rate)?;
        Ok(channel)
    }

    pub fn camp(&self) -> Camp {
        self.camp
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud
    }

    pub fn state(&self) -> ChannelState {
        if self.link.is_some() {
            ChannelState::Open
        } else {
            ChannelState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    /// Whether this camp has no vehicle wired up.
    pub fn is_disabled(&self) -> bool {
        self.port.is_empty()
    }

    /// Open `port` at `baud`. An already open channel is closed first.
    ///
    /// An empty port name leaves the channel Closed and is not an error.
    /// On failure the channel is Closed.
    pub fn open(
        &mut self,
        backend: &dyn SerialBackend,
        port: &str,
        baud: u32,
    ) -> Result<(), ChannelError> {
        self.close();
        self.port = port.to_owned();
        self.baud = baud;

        if port.is_empty() {
            log::info!("{}: no serial port configured, channel disabled", self.camp);
            return Ok(());
        }
        if baud == 0 {
            return Err(ChannelError::Handshake {
                port: port.to_owned(),
                baud,
                reason: "baud rate must be positive".into(),
            });
        }

        let link = backend.open(port, baud)?;
        self.link = Some(link);
        log::info!("{}: opened {port} at {baud} baud", self.camp);
        Ok(())
    }

    /// Close the link. Safe to call in any state.
    pub fn close(&mut self) {
        if let Some(mut link) = self.link.take() {
            if let Err(e) = link.flush() {
                log::warn!("{}: flushing {} on close failed: {e}", self.camp, self.port);
            }
            log::info!("{}: closed {}", self.camp, self.port);
        }
    }

    /// Write `bytes` to the vehicle.
    ///
    /// A Closed channel is a caller error, reported as [`ChannelError::NotOpen`].
    /// A failed write closes the channel.
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        let Some(link) = self.link.as_mut() else {
            return Err(ChannelError::NotOpen { camp: self.camp });
        };
        let written = link.write_all(bytes).and_then(|()| link.flush());
        if let Err(source) = written {
            self.link = None;
            log::error!("{}: write to {} failed, channel closed: {source}", self.camp, self.port);
            return Err(ChannelError::Send {
                camp: self.camp,
                port: self.port.clone(),
                source,
            });
        }
        Ok(())
    }

    pub fn send_pose(&mut self, pose: &Pose) -> Result<(), ChannelError> {
        self.send(&encode_pose(pose))
    }
}

impl Drop for VehicleChannel {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for VehicleChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VehicleChannel")
            .field("camp", &self.camp)
            .field("port", &self.port)
            .field("baud", &self.baud)
            .field("state", &self.state())
            .finish()
    }
}
