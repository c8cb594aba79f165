//! In-memory capture backend that plays back a fixed frame sequence.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use courtside_core::{Frame, FrameSize};
use parking_lot::Mutex;

use crate::{CaptureBackend, CaptureDevice, CaptureError};

/// Scripted failure injected at a given grab.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayFault {
    Transient,
    DeviceLost,
}

/// One replayable camera.
#[derive(Clone, Debug)]
pub struct ReplayCamera {
    frames: Arc<Vec<Frame>>,
    looping: bool,
    interval: Option<Duration>,
    faults: BTreeMap<usize, ReplayFault>,
}

impl ReplayCamera {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: Arc::new(frames),
            looping: true,
            interval: None,
            faults: BTreeMap::new(),
        }
    }

    /// Load every PNG/JPEG/BMP file in `dir`, in file-name order.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let mut paths: Vec<_> = std::fs::read_dir(dir.as_ref())?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| {
                        matches!(
                            e.to_ascii_lowercase().as_str(),
                            "png" | "jpg" | "jpeg" | "bmp"
                        )
                    })
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let frames = paths
            .iter()
            .map(|p| {
                image::open(p)
                    .map(|img| Frame::from(img.to_rgb8()))
                    .map_err(|source| CaptureError::Load {
                        path: p.display().to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("loaded {} replay frame(s) from {}", frames.len(), dir.as_ref().display());
        Ok(Self::new(frames))
    }

    /// Stop with `DeviceLost` after the last frame instead of starting over.
    pub fn once(mut self) -> Self {
        self.looping = false;
        self
    }

    /// Sleep between frames to mimic a camera frame rate.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Fail the `grab`-th grab (zero-based, counted per open) with `fault`.
    pub fn with_fault(mut self, grab: usize, fault: ReplayFault) -> Self {
        self.faults.insert(grab, fault);
        self
    }

    fn size(&self) -> FrameSize {
        self.frames
            .first()
            .map(Frame::size)
            .unwrap_or(FrameSize::new(0, 0))
    }
}

#[derive(Default)]
struct Counters {
    opens: AtomicUsize,
    releases: AtomicUsize,
}

struct Slot {
    camera: ReplayCamera,
    in_use: Arc<AtomicBool>,
}

/// Backend serving [`ReplayCamera`]s by index.
///
/// Like a physical camera, each index can be open only once at a time.
#[derive(Default)]
pub struct ReplayBackend {
    cameras: Mutex<BTreeMap<u32, Slot>>,
    counters: Arc<Counters>,
}

impl ReplayBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(self, index: u32, camera: ReplayCamera) -> Self {
        self.insert(index, camera);
        self
    }

    pub fn insert(&self, index: u32, camera: ReplayCamera) {
        self.cameras.lock().insert(
            index,
            Slot {
                camera,
                in_use: Arc::new(AtomicBool::new(false)),
            },
        );
    }

    pub fn remove(&self, index: u32) {
        self.cameras.lock().remove(&index);
    }

    pub fn open_count(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.counters.releases.load(Ordering::SeqCst)
    }

    pub fn is_in_use(&self, index: u32) -> bool {
        self.cameras
            .lock()
            .get(&index)
            .map(|s| s.in_use.load(Ordering::SeqCst))
            .unwrap_or(false)
    }
}

impl CaptureBackend for ReplayBackend {
    fn is_available(&self, index: u32) -> Option<bool> {
        Some(self.cameras.lock().contains_key(&index))
    }

    fn open(
        &self,
        index: u32,
        _requested: FrameSize,
    ) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        let cameras = self.cameras.lock();
        let slot = cameras
            .get(&index)
            .ok_or(CaptureError::Unavailable { index })?;
        if slot.camera.frames.is_empty() {
            return Err(CaptureError::Open {
                index,
                reason: "no frames to replay".into(),
            });
        }
        if slot.in_use.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::Open {
                index,
                reason: "device busy".into(),
            });
        }
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ReplayDevice {
            camera: slot.camera.clone(),
            size: slot.camera.size(),
            next: 0,
            grabs: 0,
            in_use: Some(slot.in_use.clone()),
            counters: self.counters.clone(),
        }))
    }
}

struct ReplayDevice {
    camera: ReplayCamera,
    size: FrameSize,
    next: usize,
    grabs: usize,
    in_use: Option<Arc<AtomicBool>>,
    counters: Arc<Counters>,
}

impl CaptureDevice for ReplayDevice {
    fn frame_size(&self) -> FrameSize {
        self.size
    }

    fn grab(&mut self) -> Result<Frame, CaptureError> {
        if self.in_use.is_none() {
            return Err(CaptureError::Released);
        }
        if let Some(interval) = self.camera.interval {
            std::thread::sleep(interval);
        }
        let grab = self.grabs;
        self.grabs += 1;
        match self.camera.faults.get(&grab) {
            Some(ReplayFault::Transient) => {
                return Err(CaptureError::Transient(format!("injected at grab {grab}")))
            }
            Some(ReplayFault::DeviceLost) => {
                return Err(CaptureError::DeviceLost(format!("injected at grab {grab}")))
            }
            None => {}
        }

        let frames = &self.camera.frames;
        if self.next >= frames.len() {
            if !self.camera.looping {
                return Err(CaptureError::DeviceLost("replay exhausted".into()));
            }
            self.next = 0;
        }
        let frame = frames[self.next].clone();
        self.next += 1;
        Ok(frame)
    }

    fn release(&mut self) {
        if let Some(flag) = self.in_use.take() {
            flag.store(false, Ordering::SeqCst);
            self.counters.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for ReplayDevice {
    fn drop(&mut self) {
        self.release();
    }
}
