//! Configuration snapshot types.
//!
//! A [`SystemConfig`] is the single authoritative description of the running
//! pipeline. Runtime components are rebuilt from it and never mutate it.

use crate::{Camp, ConfigError, CourtSize, FrameSize, PerCamp, HUE_MAX};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Closed interval over one 8-bit HSV channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdRange {
    pub min: u8,
    pub max: u8,
}

impl ThresholdRange {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub const FULL_HUE: Self = Self::new(0, HUE_MAX);
    pub const FULL: Self = Self::new(0, u8::MAX);

    /// Linear membership; `min > max` accepts nothing.
    #[inline]
    pub fn contains(&self, v: u8) -> bool {
        self.min <= v && v <= self.max
    }

    /// Circular membership over the hue domain.
    ///
    /// With `min > max` the accepted set wraps through the domain boundary:
    /// `{170, 10}` accepts `170..=179` and `0..=10`.
    #[inline]
    pub fn contains_circular(&self, v: u8) -> bool {
        if self.min <= self.max {
            self.contains(v)
        } else {
            v >= self.min || v <= self.max
        }
    }

    pub fn wraps(&self) -> bool {
        self.min > self.max
    }

    fn validate_linear(&self, channel: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::EmptyRange {
                camp: None,
                channel,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    fn validate_hue(&self) -> Result<(), ConfigError> {
        for value in [self.min, self.max] {
            if value > HUE_MAX {
                return Err(ConfigError::HueOutOfDomain { camp: None, value });
            }
        }
        Ok(())
    }
}

fn default_min_area() -> u32 {
    50
}

/// Color threshold settings for one camp's locator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorConfig {
    pub hue: ThresholdRange,
    pub saturation: ThresholdRange,
    pub value: ThresholdRange,
    /// Regions smaller than this many pixels are discarded.
    #[serde(default = "default_min_area")]
    pub min_area: u32,
    /// Expose the binary mask for operator diagnosis.
    #[serde(default)]
    pub show_mask: bool,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            hue: ThresholdRange::FULL_HUE,
            saturation: ThresholdRange::FULL,
            value: ThresholdRange::FULL,
            min_area: default_min_area(),
            show_mask: false,
        }
    }
}

impl LocatorConfig {
    /// Whether an HSV pixel passes all three channel tests.
    #[inline]
    pub fn accepts(&self, h: u8, s: u8, v: u8) -> bool {
        self.hue.contains_circular(h) && self.saturation.contains(s) && self.value.contains(v)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hue.validate_hue()?;
        self.saturation.validate_linear("saturation")?;
        self.value.validate_linear("value")?;
        Ok(())
    }
}

fn default_baud_rate() -> u32 {
    115_200
}

/// Everything the controller needs to know about one camp's vehicle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleConfig {
    #[serde(default)]
    pub locator: LocatorConfig,
    /// Serial device name; empty means the camp has no vehicle wired up.
    #[serde(default)]
    pub serial_port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            locator: LocatorConfig::default(),
            serial_port: String::new(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl VehicleConfig {
    pub fn show_mask(&self) -> bool {
        self.locator.show_mask
    }

    pub fn has_channel(&self) -> bool {
        !self.serial_port.is_empty()
    }

    pub fn validate(&self, camp: Camp) -> Result<(), ConfigError> {
        self.locator.validate().map_err(|e| e.for_camp(camp))?;
        if self.baud_rate == 0 {
            return Err(ConfigError::ZeroBaudRate { camp });
        }
        Ok(())
    }
}

/// Camera-pixel positions of the court corners, ordered TL, TR, BR, BL.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalibrationCorners(pub [Point2<f64>; 4]);

impl CalibrationCorners {
    pub fn new(corners: [Point2<f64>; 4]) -> Self {
        Self(corners)
    }

    /// Corners that coincide with the frame rectangle.
    pub fn frame(size: FrameSize) -> Self {
        Self(size.corners())
    }

    pub fn points(&self) -> &[Point2<f64>; 4] {
        &self.0
    }

    /// Rejects coincident points and any three points on a common line.
    pub fn check_non_degenerate(&self) -> Result<(), ConfigError> {
        let pts = &self.0;
        if pts.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(ConfigError::DegenerateCorners {
                reason: "non-finite coordinate",
            });
        }

        let scale = pts
            .iter()
            .flat_map(|a| pts.iter().map(move |b| (a - b).norm()))
            .fold(0.0_f64, f64::max);
        if scale < 1e-9 {
            return Err(ConfigError::DegenerateCorners {
                reason: "all corners coincide",
            });
        }

        let eps = 1e-9 * scale;
        for i in 0..4 {
            for j in (i + 1)..4 {
                if (pts[i] - pts[j]).norm() <= eps {
                    return Err(ConfigError::DegenerateCorners {
                        reason: "two corners coincide",
                    });
                }
            }
        }

        // Twice the triangle area, compared against scale^2.
        let area_eps = 1e-6 * scale * scale;
        for (i, j, k) in [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)] {
            let u = pts[j] - pts[i];
            let v = pts[k] - pts[i];
            if (u.x * v.y - u.y * v.x).abs() <= area_eps {
                return Err(ConfigError::DegenerateCorners {
                    reason: "three corners are collinear",
                });
            }
        }
        Ok(())
    }
}

fn default_frame_size() -> FrameSize {
    FrameSize::new(640, 480)
}

/// The complete configuration snapshot applied by the reconfiguration
/// coordinator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Zero-based capture device index.
    #[serde(default)]
    pub camera: u32,
    /// Nominal capture size requested from the camera.
    #[serde(default = "default_frame_size")]
    pub frame_size: FrameSize,
    #[serde(default = "default_frame_size")]
    pub monitor_size: FrameSize,
    pub court_size: CourtSize,
    pub calibration: CalibrationCorners,
    pub vehicles: PerCamp<VehicleConfig>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let frame_size = default_frame_size();
        Self {
            camera: 0,
            frame_size,
            monitor_size: frame_size,
            court_size: CourtSize::new(200.0, 150.0),
            calibration: CalibrationCorners::frame(frame_size),
            vehicles: PerCamp::default(),
        }
    }
}

impl SystemConfig {
    pub fn vehicle(&self, camp: Camp) -> &VehicleConfig {
        &self.vehicles[camp]
    }

    /// Validate the value ranges that the UI layer cannot express as types.
    ///
    /// Calibration degeneracy is *not* checked here: a degenerate calibration
    /// only rejects the transform rebuild, not the whole snapshot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor_size.is_empty() {
            return Err(ConfigError::EmptySize {
                what: "monitor",
                width: self.monitor_size.width as f64,
                height: self.monitor_size.height as f64,
            });
        }
        if !(self.court_size.width > 0.0 && self.court_size.height > 0.0) {
            return Err(ConfigError::EmptySize {
                what: "court",
                width: self.court_size.width,
                height: self.court_size.height,
            });
        }
        for camp in Camp::ALL {
            self.vehicles[camp].validate(camp)?;
        }
        Ok(())
    }
}
