use crate::Camp;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Pixel dimensions of a camera frame or monitor surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The four frame corners in TL, TR, BR, BL order.
    pub fn corners(&self) -> [Point2<f64>; 4] {
        rect_corners(self.width as f64, self.height as f64)
    }

    pub fn contains(&self, p: Point2<f64>) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.width as f64 && p.y <= self.height as f64
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Physical court dimensions, in whatever unit the vehicles are driven in.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CourtSize {
    pub width: f64,
    pub height: f64,
}

impl CourtSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The four court corners in TL, TR, BR, BL order.
    pub fn corners(&self) -> [Point2<f64>; 4] {
        rect_corners(self.width, self.height)
    }

    pub fn center(&self) -> Point2<f64> {
        Point2::new(self.width * 0.5, self.height * 0.5)
    }
}

fn rect_corners(w: f64, h: f64) -> [Point2<f64>; 4] {
    [
        Point2::new(0.0, 0.0),
        Point2::new(w, 0.0),
        Point2::new(w, h),
        Point2::new(0.0, h),
    ]
}

/// One connected color region found by a locator, in camera pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Region centroid.
    pub position: Point2<f64>,
    /// Region size in pixels; doubles as the confidence measure.
    pub area: u32,
    /// Principal-axis angle in radians, `(-pi/2, pi/2]`, image y pointing down.
    pub orientation: Option<f64>,
}

/// A detection expressed in court coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub camp: Camp,
    pub position: Point2<f64>,
    /// Court-space heading in radians.
    pub heading: Option<f64>,
}
