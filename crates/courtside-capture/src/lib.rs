//! Camera frame sources.
//!
//! A [`FrameSource`] owns one open capture device and yields frames from it.
//! Devices come from a [`CaptureBackend`], which lets the controller run on
//! a real camera (`opencv` feature) or on a replayed frame sequence.

mod replay;
mod source;

#[cfg(feature = "opencv")]
mod opencv_backend;

use courtside_core::{Frame, FrameSize};

pub use replay::{ReplayBackend, ReplayCamera, ReplayFault};
pub use source::FrameSource;

#[cfg(feature = "opencv")]
pub use opencv_backend::OpenCvBackend;

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("camera {index} could not be opened: {reason}")]
    Open { index: u32, reason: String },

    #[error("camera {index} is not available")]
    Unavailable { index: u32 },

    /// A single bad read; the next grab may succeed.
    #[error("frame read failed: {0}")]
    Transient(String),

    /// The device is gone and must be reopened.
    #[error("camera lost: {0}")]
    DeviceLost(String),

    #[error("frame source has been released")]
    Released,

    #[error("failed to load frame {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CaptureError::Transient(_))
    }
}

/// An open capture device.
pub trait CaptureDevice: Send {
    /// Negotiated frame size.
    fn frame_size(&self) -> FrameSize;

    /// Block until the next frame is available.
    fn grab(&mut self) -> Result<Frame, CaptureError>;

    /// Close the device. Must be idempotent.
    fn release(&mut self);
}

/// Opens capture devices by zero-based index.
pub trait CaptureBackend: Send + Sync {
    /// Whether `index` names a usable device, if the backend can tell without
    /// opening it.
    fn is_available(&self, _index: u32) -> Option<bool> {
        None
    }

    /// Open device `index`, asking for `requested` as the frame size.
    fn open(&self, index: u32, requested: FrameSize)
        -> Result<Box<dyn CaptureDevice>, CaptureError>;
}
