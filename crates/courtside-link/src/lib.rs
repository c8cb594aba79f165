//! Serial links from the controller to each camp's vehicle.
//!
//! - [`VehicleChannel`]: the per-camp `Closed -> Open -> Closed` connection.
//! - [`SerialBackend`]: how links are opened; [`SerialPortBackend`] for real
//!   devices, [`MemoryBackend`] for tests and dry runs.
//! - [`wire`]: the line format poses are sent in.

mod channel;
mod memory;
mod serial;
pub mod wire;

use std::io::Write;

pub use channel::{ChannelState, VehicleChannel};
pub use memory::MemoryBackend;
pub use serial::SerialPortBackend;
pub use wire::{decode_pose, encode_pose, WireError};

use courtside_core::Camp;

#[derive(thiserror::Error, Debug)]
pub enum ChannelError {
    #[error("serial port {port} does not exist")]
    NotFound { port: String },

    #[error("serial port {port} is already claimed")]
    Busy { port: String },

    #[error("serial port {port} failed to open at {baud} baud: {reason}")]
    Handshake {
        port: String,
        baud: u32,
        reason: String,
    },

    #[error("{camp} channel is closed")]
    NotOpen { camp: Camp },

    #[error("{camp} write to {port} failed: {source}")]
    Send {
        camp: Camp,
        port: String,
        #[source]
        source: std::io::Error,
    },
}

/// An open byte stream to a vehicle.
pub trait SerialLink: Write + Send {}

impl<T: Write + Send + ?Sized> SerialLink for T {}

/// Opens serial links by port name and baud rate.
pub trait SerialBackend: Send + Sync {
    fn open(&self, port: &str, baud: u32) -> Result<Box<dyn SerialLink>, ChannelError>;
}
