use courtside_core::{Detection, Frame, LocatorConfig, Mask};
use nalgebra::Point2;

use crate::mask::threshold_mask;
use crate::regions::find_regions;
use crate::LocateError;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Output of one locator pass over a frame.
#[derive(Clone, Debug, Default)]
pub struct Located {
    /// Every region with `area >= min_area`, largest first.
    pub detections: Vec<Detection>,
    /// The threshold mask, present only when `show_mask` is set.
    pub mask: Option<Mask>,
}

impl Located {
    /// Largest detection, if any.
    pub fn largest(&self) -> Option<&Detection> {
        self.detections.first()
    }
}

/// Color-blob locator for one camp.
///
/// Holds nothing but its configuration, so a new locator is built whenever
/// the thresholds change.
#[derive(Clone, Debug)]
pub struct VehicleLocator {
    config: LocatorConfig,
}

impl VehicleLocator {
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Find this camp's color regions in `frame`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn locate(&self, frame: &Frame) -> Result<Located, LocateError> {
        let mask = threshold_mask(frame, &self.config)?;

        let mut detections: Vec<Detection> = find_regions(&mask)
            .into_iter()
            .filter(|r| r.area >= self.config.min_area)
            .map(|r| {
                let (cx, cy) = r.centroid();
                Detection {
                    position: Point2::new(cx, cy),
                    area: r.area,
                    orientation: r.orientation(),
                }
            })
            .collect();
        // Stable: equal areas keep raster order.
        detections.sort_by(|a, b| b.area.cmp(&a.area));

        log::trace!(
            "locator: {} region(s) >= {} px, {} mask pixels",
            detections.len(),
            self.config.min_area,
            mask.count_on()
        );

        Ok(Located {
            detections,
            mask: self.config.show_mask.then_some(mask),
        })
    }
}

/// One-shot form of [`VehicleLocator::locate`].
pub fn locate(frame: &Frame, config: &LocatorConfig) -> Result<Located, LocateError> {
    VehicleLocator::new(*config).locate(frame)
}
