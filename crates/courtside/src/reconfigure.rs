//! Applying a configuration snapshot to the live pipeline.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use courtside_capture::{CaptureBackend, CaptureError, FrameSource};
use courtside_core::{CalibratedTransform, Camp, ConfigError, FrameSize, PerCamp, SystemConfig};
use courtside_link::{ChannelError, ChannelState, SerialBackend, VehicleChannel};
use courtside_locator::VehicleLocator;
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use serde::Serialize;

use crate::SharedPipeline;

/// The resource a reconfiguration step rebuilds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Camera,
    Transform,
    Locator,
    Channel,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Camera => "camera",
            Resource::Transform => "transform",
            Resource::Locator => "locator",
            Resource::Channel => "channel",
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StepErrorKind {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Device(#[from] CaptureError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// One failed reconfiguration step.
#[derive(Debug)]
pub struct StepError {
    pub camp: Option<Camp>,
    pub resource: Resource,
    pub kind: StepErrorKind,
}

impl StepError {
    fn new(camp: Option<Camp>, resource: Resource, kind: impl Into<StepErrorKind>) -> Self {
        Self {
            camp,
            resource,
            kind: kind.into(),
        }
    }

    pub fn is_channel_error(&self) -> bool {
        matches!(self.kind, StepErrorKind::Channel(_))
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.camp {
            Some(camp) => write!(f, "{camp} {}: {}", self.resource, self.kind),
            None => write!(f, "{}: {}", self.resource, self.kind),
        }
    }
}

impl std::error::Error for StepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Per-step outcome of one [`ReconfigurationCoordinator::apply`].
#[derive(Debug)]
pub struct ReconfigureReport {
    /// Negotiated frame size of the newly opened camera.
    pub camera: Result<FrameSize, StepError>,
    pub transform: Result<(), StepError>,
    pub locators: PerCamp<Result<(), StepError>>,
    /// Channel state after the step. Closed with `Ok` means the camp is disabled.
    pub channels: PerCamp<Result<ChannelState, StepError>>,
    pub elapsed: Duration,
}

impl ReconfigureReport {
    pub fn errors(&self) -> Vec<&StepError> {
        let mut errors = Vec::new();
        errors.extend(self.camera.as_ref().err());
        errors.extend(self.transform.as_ref().err());
        for camp in Camp::ALL {
            errors.extend(self.locators[camp].as_ref().err());
            errors.extend(self.channels[camp].as_ref().err());
        }
        errors
    }

    pub fn is_success(&self) -> bool {
        self.errors().is_empty()
    }

    /// Errors attributed to `camp`.
    pub fn camp_errors(&self, camp: Camp) -> Vec<&StepError> {
        self.errors()
            .into_iter()
            .filter(|e| e.camp == Some(camp))
            .collect()
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            ok: self.is_success(),
            camera: self.camera.as_ref().ok().copied(),
            channels: self
                .channels
                .as_ref()
                .map(|_, r| r.as_ref().ok().map(ToString::to_string)),
            errors: self
                .errors()
                .into_iter()
                .map(|e| StepErrorSummary {
                    camp: e.camp,
                    resource: e.resource,
                    message: e.kind.to_string(),
                })
                .collect(),
            elapsed_ms: self.elapsed.as_secs_f64() * 1000.0,
        }
    }
}

/// Serializable view of a [`ReconfigureReport`].
#[derive(Clone, Debug, Serialize)]
pub struct ReportSummary {
    pub ok: bool,
    pub camera: Option<FrameSize>,
    pub channels: PerCamp<Option<String>>,
    pub errors: Vec<StepErrorSummary>,
    pub elapsed_ms: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct StepErrorSummary {
    pub camp: Option<Camp>,
    pub resource: Resource,
    pub message: String,
}

/// Rebuilds pipeline resources from configuration snapshots.
///
/// Every resource is built completely before it is published, so the
/// detection loop only ever sees either the old or the new instance. Applies
/// are serialized.
pub struct ReconfigurationCoordinator {
    pipeline: Arc<SharedPipeline>,
    capture: Arc<dyn CaptureBackend>,
    serial: Arc<dyn SerialBackend>,
    applying: Mutex<()>,
}

impl ReconfigurationCoordinator {
    pub fn new(
        pipeline: Arc<SharedPipeline>,
        capture: Arc<dyn CaptureBackend>,
        serial: Arc<dyn SerialBackend>,
    ) -> Self {
        Self {
            pipeline,
            capture,
            serial,
            applying: Mutex::new(()),
        }
    }

    pub fn pipeline(&self) -> &Arc<SharedPipeline> {
        &self.pipeline
    }

    /// Apply `config`: camera, then transform, then each camp's locator and
    /// channel. A failed step keeps (or clears) only its own resource.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip_all, fields(camera = config.camera)))]
    pub fn apply(&self, config: Arc<SystemConfig>) -> ReconfigureReport {
        let _guard = self.applying.lock();
        let started = Instant::now();

        let camera = self.apply_camera(&config);
        let frame_size = camera
            .as_ref()
            .ok()
            .copied()
            .or_else(|| self.pipeline.last_frame_size())
            .unwrap_or(config.frame_size);
        let transform = self.apply_transform(&config, frame_size);

        let mut locators: PerCamp<Result<(), StepError>> = PerCamp::from_fn(|_| Ok(()));
        let mut channels: PerCamp<Result<ChannelState, StepError>> =
            PerCamp::from_fn(|_| Ok(ChannelState::Closed));
        for camp in Camp::ALL {
            locators[camp] = self.apply_locator(&config, camp);
            channels[camp] = self.apply_channel(&config, camp);
        }

        self.pipeline.publish_config(config);
        let report = ReconfigureReport {
            camera,
            transform,
            locators,
            channels,
            elapsed: started.elapsed(),
        };
        let errors = report.errors();
        if errors.is_empty() {
            log::info!("reconfiguration applied in {:.1?}", report.elapsed);
        } else {
            log::warn!(
                "reconfiguration finished with {} failed step(s) in {:.1?}",
                errors.len(),
                report.elapsed
            );
        }
        report
    }

    /// Run [`apply`](Self::apply) on its own thread and deliver the report on
    /// the returned channel.
    pub fn spawn_apply(self: &Arc<Self>, config: Arc<SystemConfig>) -> Receiver<ReconfigureReport> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let coordinator = Arc::clone(self);
        std::thread::spawn(move || {
            let report = coordinator.apply(config);
            if tx.send(report).is_err() {
                log::debug!("reconfiguration report dropped: receiver gone");
            }
        });
        rx
    }

    fn apply_camera(&self, config: &SystemConfig) -> Result<FrameSize, StepError> {
        let index = config.camera;
        if self.capture.is_available(index) == Some(false) {
            let err = StepError::new(None, Resource::Camera, CaptureError::Unavailable { index });
            log::warn!("{err}; keeping the current camera");
            return Err(err);
        }

        // Release first: the new index may be the same device.
        if let Some(mut old) = self.pipeline.take_source() {
            old.release();
        }
        match FrameSource::open(self.capture.as_ref(), index, config.frame_size) {
            Ok(source) => {
                let size = source.frame_size();
                self.pipeline.install_source(source);
                Ok(size)
            }
            Err(e) => {
                let err = StepError::new(None, Resource::Camera, e);
                log::error!("{err}; running without a camera");
                Err(err)
            }
        }
    }

    fn apply_transform(&self, config: &SystemConfig, frame_size: FrameSize) -> Result<(), StepError> {
        match CalibratedTransform::new(
            frame_size,
            config.monitor_size,
            config.court_size,
            config.calibration,
        ) {
            Ok(transform) => {
                self.pipeline.publish_transform(transform);
                Ok(())
            }
            Err(e) => {
                let err = StepError::new(None, Resource::Transform, e);
                log::warn!("{err}; keeping the previous transform");
                Err(err)
            }
        }
    }

    fn apply_locator(&self, config: &SystemConfig, camp: Camp) -> Result<(), StepError> {
        let locator = &config.vehicle(camp).locator;
        if let Err(e) = locator.validate() {
            let err = StepError::new(Some(camp), Resource::Locator, e.for_camp(camp));
            log::warn!("{err}; keeping the previous locator");
            return Err(err);
        }
        self.pipeline
            .publish_locator(camp, VehicleLocator::new(*locator));
        Ok(())
    }

    fn apply_channel(&self, config: &SystemConfig, camp: Camp) -> Result<ChannelState, StepError> {
        let vehicle = config.vehicle(camp);
        let old = self.pipeline.swap_channel(camp, VehicleChannel::new(camp));
        drop(old);

        match VehicleChannel::connect(camp, self.serial.as_ref(), vehicle) {
            Ok(channel) => {
                let state = channel.state();
                self.pipeline.swap_channel(camp, channel);
                Ok(state)
            }
            Err(e) => {
                let err = StepError::new(Some(camp), Resource::Channel, e);
                log::error!("{err}");
                Err(err)
            }
        }
    }
}

impl fmt::Debug for ReconfigurationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconfigurationCoordinator")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
