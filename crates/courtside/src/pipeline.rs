use std::sync::Arc;

use courtside_capture::{CaptureError, FrameSource};
use courtside_core::{CalibratedTransform, Camp, Frame, FrameSize, LocatorConfig, PerCamp, SystemConfig};
use courtside_link::{ChannelError, ChannelState, VehicleChannel};
use courtside_locator::VehicleLocator;
use parking_lot::{Mutex, RwLock};

/// Live resources shared by the detection loop and the coordinator.
///
/// Values behind the `RwLock`s are immutable once published and are replaced
/// whole. The frame source and the channels are exclusive and sit behind a
/// `Mutex`; the loop holds each lock for a single grab or send.
pub struct SharedPipeline {
    source: Mutex<Option<FrameSource>>,
    last_frame_size: Mutex<Option<FrameSize>>,
    transform: RwLock<Option<Arc<CalibratedTransform>>>,
    locators: PerCamp<RwLock<Arc<VehicleLocator>>>,
    channels: PerCamp<Mutex<VehicleChannel>>,
    config: RwLock<Option<Arc<SystemConfig>>>,
}

impl Default for SharedPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedPipeline {
    /// An idle pipeline: no camera, no transform, closed channels.
    pub fn new() -> Self {
        Self {
            source: Mutex::new(None),
            last_frame_size: Mutex::new(None),
            transform: RwLock::new(None),
            locators: PerCamp::from_fn(|_| {
                RwLock::new(Arc::new(VehicleLocator::new(LocatorConfig::default())))
            }),
            channels: PerCamp::from_fn(|camp| Mutex::new(VehicleChannel::new(camp))),
            config: RwLock::new(None),
        }
    }

    /// Grab one frame from the current source, if there is one, together
    /// with the index of the camera that produced it.
    ///
    /// A source that reports `DeviceLost` is dropped from the pipeline.
    pub fn grab(&self) -> Option<(u32, Result<Frame, CaptureError>)> {
        let mut slot = self.source.lock();
        let source = slot.as_mut()?;
        let index = source.index();
        let result = source.grab();
        if matches!(result, Err(CaptureError::DeviceLost(_))) {
            *slot = None;
        }
        Some((index, result))
    }

    pub fn has_source(&self) -> bool {
        self.source.lock().is_some()
    }

    /// Index of the open camera.
    pub fn camera_index(&self) -> Option<u32> {
        self.source.lock().as_ref().map(FrameSource::index)
    }

    /// Size negotiated by the most recently opened camera.
    pub fn last_frame_size(&self) -> Option<FrameSize> {
        *self.last_frame_size.lock()
    }

    pub fn transform(&self) -> Option<Arc<CalibratedTransform>> {
        self.transform.read().clone()
    }

    pub fn locator(&self, camp: Camp) -> Arc<VehicleLocator> {
        self.locators[camp].read().clone()
    }

    /// The snapshot applied most recently.
    pub fn config(&self) -> Option<Arc<SystemConfig>> {
        self.config.read().clone()
    }

    pub fn channel_state(&self, camp: Camp) -> ChannelState {
        self.channels[camp].lock().state()
    }

    /// Send `bytes` on `camp`'s channel. `None` when the channel is Closed.
    pub fn send(&self, camp: Camp, bytes: &[u8]) -> Option<Result<(), ChannelError>> {
        let mut channel = self.channels[camp].lock();
        if !channel.is_open() {
            return None;
        }
        Some(channel.send(bytes))
    }

    /// Release the camera and close both channels.
    pub fn shutdown(&self) {
        drop(self.take_source());
        for camp in Camp::ALL {
            self.channels[camp].lock().close();
        }
    }

    pub(crate) fn take_source(&self) -> Option<FrameSource> {
        self.source.lock().take()
    }

    pub(crate) fn install_source(&self, source: FrameSource) {
        *self.last_frame_size.lock() = Some(source.frame_size());
        let previous = self.source.lock().replace(source);
        drop(previous);
    }

    pub(crate) fn publish_transform(&self, transform: CalibratedTransform) {
        *self.transform.write() = Some(Arc::new(transform));
    }

    pub(crate) fn publish_locator(&self, camp: Camp, locator: VehicleLocator) {
        *self.locators[camp].write() = Arc::new(locator);
    }

    /// Swap `channel` in, returning the channel it replaces.
    pub(crate) fn swap_channel(&self, camp: Camp, channel: VehicleChannel) -> VehicleChannel {
        std::mem::replace(&mut *self.channels[camp].lock(), channel)
    }

    pub(crate) fn publish_config(&self, config: Arc<SystemConfig>) {
        *self.config.write() = Some(config);
    }
}

impl std::fmt::Debug for SharedPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedPipeline")
            .field("camera", &self.camera_index())
            .field("transform", &self.transform.read().is_some())
            .field("channel_a", &self.channel_state(Camp::A))
            .field("channel_b", &self.channel_state(Camp::B))
            .finish()
    }
}
