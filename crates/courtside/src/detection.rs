//! The frame loop: grab, locate per camp, map to court, send.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use courtside_capture::CaptureError;
use courtside_core::{Camp, Detection, FrameSize, Mask, PerCamp, Pose};
use courtside_link::{encode_pose, ChannelError};
use courtside_locator::LocateError;
use crossbeam_channel::{Sender, TrySendError};

use crate::SharedPipeline;

/// Chooses which of a camp's detections become poses.
///
/// Detections arrive largest first.
pub trait PoseSelector: Send {
    fn select(&mut self, camp: Camp, detections: &[Detection]) -> Vec<Detection>;
}

/// Keep only the largest region.
#[derive(Clone, Copy, Debug, Default)]
pub struct LargestArea;

impl PoseSelector for LargestArea {
    fn select(&mut self, _camp: Camp, detections: &[Detection]) -> Vec<Detection> {
        detections.first().copied().into_iter().collect()
    }
}

/// Pass every detection through.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllDetections;

impl PoseSelector for AllDetections {
    fn select(&mut self, _camp: Camp, detections: &[Detection]) -> Vec<Detection> {
        detections.to_vec()
    }
}

impl<F> PoseSelector for F
where
    F: FnMut(Camp, &[Detection]) -> Vec<Detection> + Send,
{
    fn select(&mut self, camp: Camp, detections: &[Detection]) -> Vec<Detection> {
        self(camp, detections)
    }
}

/// Cooperative stop signal for a running loop.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A per-camp failure inside one frame. The loop carries on.
#[derive(Debug)]
pub enum CampFault {
    Locate(LocateError),
    Send(ChannelError),
}

impl std::fmt::Display for CampFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampFault::Locate(e) => write!(f, "locator: {e}"),
            CampFault::Send(e) => write!(f, "channel: {e}"),
        }
    }
}

/// What one frame produced.
#[derive(Debug)]
pub struct FrameReport {
    /// Zero-based count of processed frames.
    pub frame: u64,
    pub size: FrameSize,
    pub detections: PerCamp<Vec<Detection>>,
    /// Selected detections mapped to the court. Empty without a transform.
    pub poses: PerCamp<Vec<Pose>>,
    /// Threshold masks of camps with `show_mask` set.
    pub masks: PerCamp<Option<Mask>>,
    pub faults: PerCamp<Vec<CampFault>>,
}

#[derive(Debug)]
pub enum LoopEvent {
    Frame(Box<FrameReport>),
    DeviceLost { camera: u32, reason: String },
}

#[derive(thiserror::Error, Debug)]
pub enum LoopError {
    #[error("camera {camera} lost: {source}")]
    DeviceLost {
        camera: u32,
        #[source]
        source: CaptureError,
    },
}

/// Counters returned when a loop ends normally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames: u64,
    pub transient_errors: u64,
    pub poses_sent: u64,
    pub send_failures: u64,
    pub reports_dropped: u64,
}

/// Runs detection against a [`SharedPipeline`] until stopped.
pub struct DetectionLoop {
    pipeline: Arc<SharedPipeline>,
    selector: Box<dyn PoseSelector>,
    stop: StopFlag,
    observer: Option<Sender<LoopEvent>>,
    idle_interval: Duration,
    max_frames: Option<u64>,
}

impl DetectionLoop {
    pub fn new(pipeline: Arc<SharedPipeline>) -> Self {
        Self {
            pipeline,
            selector: Box::new(LargestArea),
            stop: StopFlag::new(),
            observer: None,
            idle_interval: Duration::from_millis(20),
            max_frames: None,
        }
    }

    pub fn with_selector(mut self, selector: impl PoseSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    /// Receive a [`LoopEvent`] per frame. Events are dropped while the
    /// channel is full.
    pub fn with_observer(mut self, observer: Sender<LoopEvent>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// How long to sleep when there is no camera.
    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }

    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    pub fn with_stop_flag(mut self, stop: StopFlag) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    pub fn spawn(self) -> JoinHandle<Result<LoopStats, LoopError>> {
        std::thread::spawn(move || self.run())
    }

    pub fn run(mut self) -> Result<LoopStats, LoopError> {
        let mut stats = LoopStats::default();
        log::info!("detection loop started");

        while !self.stop.is_raised() {
            if self.max_frames.is_some_and(|max| stats.frames >= max) {
                break;
            }
            let frame = match self.pipeline.grab() {
                None => {
                    std::thread::sleep(self.idle_interval);
                    continue;
                }
                Some((_, Ok(frame))) => frame,
                Some((_, Err(e))) if e.is_transient() => {
                    log::warn!("skipping frame: {e}");
                    stats.transient_errors += 1;
                    continue;
                }
                Some((camera, Err(source @ CaptureError::DeviceLost(_)))) => {
                    self.emit(
                        LoopEvent::DeviceLost {
                            camera,
                            reason: source.to_string(),
                        },
                        &mut stats,
                    );
                    log::error!("detection loop stopping: camera {camera} lost");
                    return Err(LoopError::DeviceLost { camera, source });
                }
                Some((_, Err(e))) => {
                    log::warn!("camera not ready: {e}");
                    std::thread::sleep(self.idle_interval);
                    continue;
                }
            };

            let report = self.process(&frame, stats.frames, &mut stats);
            stats.frames += 1;
            self.emit(LoopEvent::Frame(Box::new(report)), &mut stats);
        }

        log::info!(
            "detection loop stopped after {} frame(s), {} pose(s) sent",
            stats.frames,
            stats.poses_sent
        );
        Ok(stats)
    }

    fn process(
        &mut self,
        frame: &courtside_core::Frame,
        index: u64,
        stats: &mut LoopStats,
    ) -> FrameReport {
        let transform = self.pipeline.transform();
        let mut report = FrameReport {
            frame: index,
            size: frame.size(),
            detections: PerCamp::default(),
            poses: PerCamp::default(),
            masks: PerCamp::default(),
            faults: PerCamp::default(),
        };

        for camp in Camp::ALL {
            let located = match self.pipeline.locator(camp).locate(frame) {
                Ok(located) => located,
                Err(e) => {
                    log::warn!("{camp} locator: {e}");
                    report.faults[camp].push(CampFault::Locate(e));
                    continue;
                }
            };
            report.masks[camp] = located.mask;

            if let Some(transform) = &transform {
                for detection in self.selector.select(camp, &located.detections) {
                    let Some(pose) = transform.pose(camp, &detection) else {
                        continue;
                    };
                    match self.pipeline.send(camp, &encode_pose(&pose)) {
                        Some(Ok(())) => stats.poses_sent += 1,
                        Some(Err(e)) => {
                            stats.send_failures += 1;
                            report.faults[camp].push(CampFault::Send(e));
                        }
                        None => {}
                    }
                    report.poses[camp].push(pose);
                }
            }
            report.detections[camp] = located.detections;
        }
        report
    }

    fn emit(&self, event: LoopEvent, stats: &mut LoopStats) {
        let Some(observer) = &self.observer else {
            return;
        };
        match observer.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => stats.reports_dropped += 1,
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}
