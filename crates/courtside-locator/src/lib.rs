//! HSV color-blob vehicle locator.
//!
//! Pipeline per frame:
//! - convert each pixel to HSV and test it against the camp's three ranges
//!   (hue is circular, so `min > max` wraps through zero),
//! - label 8-connected regions of the resulting mask,
//! - keep regions of at least `min_area` pixels and report their centroid,
//!   area and principal axis.
//!
//! Every surviving region is returned; choosing "the" vehicle among several
//! is left to the caller.

mod locator;
pub mod mask;
pub mod regions;

use courtside_core::PixelLayout;

pub use locator::{locate, Located, VehicleLocator};
pub use mask::threshold_mask;
pub use regions::{find_regions, Region};

/// Per-frame locator failures. None of these are fatal to the frame loop.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    #[error("empty frame")]
    EmptyFrame,

    #[error("unsupported pixel layout {0:?} (need a color frame)")]
    UnsupportedLayout(PixelLayout),

    #[error("frame buffer has {got} bytes, expected {expected}")]
    BufferSize { expected: usize, got: usize },
}
