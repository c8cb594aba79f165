//! USB/V4L camera capture through OpenCV's `videoio`.

use courtside_core::{Frame, FrameSize, PixelLayout};
use opencv::{
    core::{Mat, CV_8U},
    prelude::*,
    videoio::{VideoCapture, CAP_ANY, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};

use crate::{CaptureBackend, CaptureDevice, CaptureError};

/// Consecutive empty reads after which the camera is considered gone.
const MAX_EMPTY_READS: u32 = 30;

/// Backend opening cameras with `VideoCapture::new(index, CAP_ANY)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenCvBackend;

impl CaptureBackend for OpenCvBackend {
    fn open(
        &self,
        index: u32,
        requested: FrameSize,
    ) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        let open_err = |e: opencv::Error| CaptureError::Open {
            index,
            reason: e.message,
        };

        let mut capture = VideoCapture::new(index as i32, CAP_ANY).map_err(open_err)?;
        if !capture.is_opened().map_err(open_err)? {
            return Err(CaptureError::Open {
                index,
                reason: "device did not open".into(),
            });
        }

        if !requested.is_empty() {
            // Drivers are free to ignore these; the negotiated size is read back below.
            let _ = capture.set(CAP_PROP_FRAME_WIDTH, requested.width as f64);
            let _ = capture.set(CAP_PROP_FRAME_HEIGHT, requested.height as f64);
        }

        let width = capture.get(CAP_PROP_FRAME_WIDTH).map_err(open_err)?;
        let height = capture.get(CAP_PROP_FRAME_HEIGHT).map_err(open_err)?;
        let size = FrameSize::new(width.max(0.0) as u32, height.max(0.0) as u32);

        Ok(Box::new(OpenCvDevice {
            index,
            size,
            capture: Some(capture),
            empty_reads: 0,
        }))
    }
}

struct OpenCvDevice {
    index: u32,
    size: FrameSize,
    capture: Option<VideoCapture>,
    empty_reads: u32,
}

impl CaptureDevice for OpenCvDevice {
    fn frame_size(&self) -> FrameSize {
        self.size
    }

    fn grab(&mut self) -> Result<Frame, CaptureError> {
        let capture = self.capture.as_mut().ok_or(CaptureError::Released)?;
        let mut mat = Mat::default();
        let got = capture
            .read(&mut mat)
            .map_err(|e| CaptureError::Transient(e.message))?;

        if !got || mat.empty() {
            self.empty_reads += 1;
            if self.empty_reads >= MAX_EMPTY_READS {
                return Err(CaptureError::DeviceLost(format!(
                    "camera {} returned no frame {} times in a row",
                    self.index, self.empty_reads
                )));
            }
            return Err(CaptureError::Transient("no frame available".into()));
        }
        self.empty_reads = 0;
        mat_to_frame(&mat)
    }

    fn release(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            if let Err(e) = capture.release() {
                log::warn!("camera {}: release failed: {}", self.index, e.message);
            }
        }
    }
}

impl Drop for OpenCvDevice {
    fn drop(&mut self) {
        self.release();
    }
}

fn mat_to_frame(mat: &Mat) -> Result<Frame, CaptureError> {
    if mat.depth() != CV_8U {
        return Err(CaptureError::Transient(format!(
            "unsupported sample depth {}",
            mat.depth()
        )));
    }
    let layout = match mat.channels() {
        3 => PixelLayout::Bgr8,
        4 => PixelLayout::Bgra8,
        1 => PixelLayout::Gray8,
        n => {
            return Err(CaptureError::Transient(format!(
                "unsupported channel count {n}"
            )))
        }
    };

    let owned;
    let mat = if mat.is_continuous() {
        mat
    } else {
        owned = mat
            .try_clone()
            .map_err(|e| CaptureError::Transient(e.message))?;
        &owned
    };
    let bytes = mat
        .data_bytes()
        .map_err(|e| CaptureError::Transient(e.message))?;
    Ok(Frame::new(
        mat.cols() as usize,
        mat.rows() as usize,
        layout,
        bytes.to_vec(),
    ))
}
