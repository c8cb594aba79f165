//! Field controller for a two-camp robot court.
//!
//! This crate ties the workspace together:
//! - re-exports of the component crates,
//! - [`SharedPipeline`]: the live handles the detection loop reads,
//! - [`ReconfigurationCoordinator`]: applies a new [`SystemConfig`] snapshot
//!   step by step and reports per-step results,
//! - [`DetectionLoop`]: grab, locate, map to court, send.
//!
//! ## Quickstart
//!
//! ```no_run
//! use std::sync::Arc;
//! use courtside::capture::{ReplayBackend, ReplayCamera};
//! use courtside::link::MemoryBackend;
//! use courtside::{DetectionLoop, ReconfigurationCoordinator, SharedPipeline, SystemConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(courtside::io::load_config("court.json")?);
//! let camera = ReplayCamera::from_dir("frames")?;
//! let pipeline = Arc::new(SharedPipeline::new());
//! let coordinator = ReconfigurationCoordinator::new(
//!     pipeline.clone(),
//!     Arc::new(ReplayBackend::new().with_camera(config.camera, camera)),
//!     Arc::new(MemoryBackend::new()),
//! );
//! let report = coordinator.apply(config);
//! for err in report.errors() {
//!     eprintln!("{err}");
//! }
//! let stats = DetectionLoop::new(pipeline).with_max_frames(100).run()?;
//! println!("{} frames", stats.frames);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `courtside::core`: camps, config snapshot, frames, calibration.
//! - `courtside::locator`: HSV threshold and connected regions.
//! - `courtside::capture`: frame sources and capture backends.
//! - `courtside::link`: serial vehicle channels and the pose wire format.

pub use courtside_capture as capture;
pub use courtside_core as core;
pub use courtside_link as link;
pub use courtside_locator as locator;

pub use courtside_core::{
    CalibratedTransform, Camp, Detection, FrameSize, PerCamp, Pose, SystemConfig,
};

mod detection;
pub mod io;
mod pipeline;
mod reconfigure;

pub use detection::{
    AllDetections, CampFault, DetectionLoop, FrameReport, LargestArea, LoopError, LoopEvent,
    LoopStats, PoseSelector, StopFlag,
};
pub use pipeline::SharedPipeline;
pub use reconfigure::{
    ReconfigurationCoordinator, ReconfigureReport, ReportSummary, Resource, StepError,
    StepErrorKind,
};
