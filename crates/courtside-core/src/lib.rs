//! Core types for the courtside field controller.
//!
//! Camps, configuration snapshots, frame buffers, HSV conversion and the
//! camera-to-court calibration. Purely computational: no devices here.

mod camp;
mod config;
mod error;
mod homography;
mod hsv;
mod image;
mod logger;
mod transform;
mod types;

pub use camp::{Camp, PerCamp};
pub use config::{
    CalibrationCorners, LocatorConfig, SystemConfig, ThresholdRange, VehicleConfig,
};
pub use error::ConfigError;
pub use homography::{homography_from_4pt, Homography};
pub use hsv::{rgb_to_hsv, HUE_MAX};
pub use image::{Frame, Mask, PixelLayout};
pub use transform::CalibratedTransform;
pub use types::{CourtSize, Detection, FrameSize, Pose};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
