use courtside_core::{Frame, FrameSize};

use crate::{CaptureBackend, CaptureDevice, CaptureError};

/// The open camera feeding the detection loop.
pub struct FrameSource {
    index: u32,
    size: FrameSize,
    device: Option<Box<dyn CaptureDevice>>,
}

impl FrameSource {
    /// Open camera `index` and record the size it actually negotiated.
    pub fn open(
        backend: &dyn CaptureBackend,
        index: u32,
        requested: FrameSize,
    ) -> Result<Self, CaptureError> {
        let device = backend.open(index, requested)?;
        let size = device.frame_size();
        if size.is_empty() {
            let mut device = device;
            device.release();
            return Err(CaptureError::Open {
                index,
                reason: format!("device reported an empty frame size ({size})"),
            });
        }
        if size != requested {
            log::info!("camera {index}: requested {requested}, negotiated {size}");
        } else {
            log::info!("camera {index}: opened at {size}");
        }
        Ok(Self {
            index,
            size,
            device: Some(device),
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn frame_size(&self) -> FrameSize {
        self.size
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Next frame. A lost device is released before the error is returned.
    pub fn grab(&mut self) -> Result<Frame, CaptureError> {
        let device = self.device.as_mut().ok_or(CaptureError::Released)?;
        match device.grab() {
            Err(err @ CaptureError::DeviceLost(_)) => {
                log::error!("camera {}: {err}", self.index);
                self.release();
                Err(err)
            }
            other => other,
        }
    }

    pub fn release(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.release();
            log::info!("camera {} released", self.index);
        }
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for FrameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSource")
            .field("index", &self.index)
            .field("size", &self.size)
            .field("open", &self.is_open())
            .finish()
    }
}
