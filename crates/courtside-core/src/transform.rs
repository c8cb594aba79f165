//! Camera-to-court calibration.

use crate::{
    homography_from_4pt, CalibrationCorners, Camp, ConfigError, CourtSize, Detection, FrameSize,
    Homography, Pose,
};
use nalgebra::{Point2, Vector2};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Immutable mapping from camera pixels to court and display coordinates.
///
/// Built once from a full set of inputs; any change to them means building a
/// new instance and publishing it in place of the old one.
#[derive(Clone, Debug)]
pub struct CalibratedTransform {
    camera_size: FrameSize,
    monitor_size: FrameSize,
    court_size: CourtSize,
    corners: CalibrationCorners,
    court_from_camera: Homography,
    camera_from_court: Homography,
    display_from_camera: Homography,
}

impl CalibratedTransform {
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(corners), fields(camera = %camera_size, monitor = %monitor_size))
    )]
    pub fn new(
        camera_size: FrameSize,
        monitor_size: FrameSize,
        court_size: CourtSize,
        corners: CalibrationCorners,
    ) -> Result<Self, ConfigError> {
        check_frame("camera", camera_size)?;
        check_frame("monitor", monitor_size)?;
        if !(court_size.width > 0.0 && court_size.height > 0.0) {
            return Err(ConfigError::EmptySize {
                what: "court",
                width: court_size.width,
                height: court_size.height,
            });
        }
        corners.check_non_degenerate()?;

        let court_from_camera = homography_from_4pt(corners.points(), &court_size.corners())
            .ok_or(ConfigError::SingularHomography)?;
        let camera_from_court = court_from_camera
            .inverse()
            .ok_or(ConfigError::SingularHomography)?;
        let display_from_camera =
            homography_from_4pt(&camera_size.corners(), &monitor_size.corners())
                .ok_or(ConfigError::SingularHomography)?;

        for (i, p) in corners.points().iter().enumerate() {
            if !camera_size.contains(*p) {
                log::warn!(
                    "calibration corner {i} ({:.1}, {:.1}) lies outside the {camera_size} frame",
                    p.x,
                    p.y
                );
            }
        }

        Ok(Self {
            camera_size,
            monitor_size,
            court_size,
            corners,
            court_from_camera,
            camera_from_court,
            display_from_camera,
        })
    }

    pub fn camera_size(&self) -> FrameSize {
        self.camera_size
    }

    pub fn monitor_size(&self) -> FrameSize {
        self.monitor_size
    }

    pub fn court_size(&self) -> CourtSize {
        self.court_size
    }

    pub fn corners(&self) -> &CalibrationCorners {
        &self.corners
    }

    /// Camera pixel to court coordinates.
    #[inline]
    pub fn to_court(&self, p: Point2<f64>) -> Option<Point2<f64>> {
        self.court_from_camera.apply(p)
    }

    /// Court coordinates back to camera pixels, for overlays.
    #[inline]
    pub fn to_camera(&self, p: Point2<f64>) -> Option<Point2<f64>> {
        self.camera_from_court.apply(p)
    }

    /// Camera pixel to monitor pixel. Only meant for overlay rendering.
    #[inline]
    pub fn to_display(&self, p: Point2<f64>) -> Option<Point2<f64>> {
        self.display_from_camera.apply(p)
    }

    /// Express a detection in court space.
    ///
    /// The heading is the court-space angle of the region's principal axis,
    /// so it carries the same 180 degree ambiguity as the axis itself.
    pub fn pose(&self, camp: Camp, detection: &Detection) -> Option<Pose> {
        let position = self.to_court(detection.position)?;
        let heading = detection.orientation.and_then(|theta| {
            let dir = Vector2::new(theta.cos(), theta.sin());
            self.court_from_camera
                .apply_direction(detection.position, dir)
                .map(|d| d.y.atan2(d.x))
        });
        Some(Pose {
            camp,
            position,
            heading,
        })
    }
}

fn check_frame(what: &'static str, size: FrameSize) -> Result<(), ConfigError> {
    if size.is_empty() {
        return Err(ConfigError::EmptySize {
            what,
            width: size.width as f64,
            height: size.height as f64,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tilted_corners() -> CalibrationCorners {
        CalibrationCorners::new([
            Point2::new(112.0, 64.0),
            Point2::new(530.0, 80.0),
            Point2::new(600.0, 440.0),
            Point2::new(40.0, 420.0),
        ])
    }

    fn build(corners: CalibrationCorners) -> Result<CalibratedTransform, ConfigError> {
        CalibratedTransform::new(
            FrameSize::new(640, 480),
            FrameSize::new(1280, 960),
            CourtSize::new(200.0, 150.0),
            corners,
        )
    }

    #[test]
    fn calibration_corners_land_on_court_corners() {
        let t = build(tilted_corners()).expect("valid calibration");
        let court = t.court_size().corners();
        for (corner, expected) in t.corners().points().iter().zip(court) {
            let got = t.to_court(*corner).expect("finite");
            assert_abs_diff_eq!(got.x, expected.x, epsilon = 1e-6);
            assert_abs_diff_eq!(got.y, expected.y, epsilon = 1e-6);
        }
    }

    #[test]
    fn frame_aligned_calibration_maps_center_to_court_center() {
        let t = build(CalibrationCorners::frame(FrameSize::new(640, 480))).expect("valid");
        let c = t.to_court(Point2::new(320.0, 240.0)).expect("finite");
        assert_abs_diff_eq!(c.x, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.y, 75.0, epsilon = 1e-9);
    }

    #[test]
    fn display_mapping_is_independent_of_calibration() {
        let t = build(tilted_corners()).expect("valid");
        let d = t.to_display(Point2::new(320.0, 240.0)).expect("finite");
        assert_abs_diff_eq!(d.x, 640.0, epsilon = 1e-9);
        assert_abs_diff_eq!(d.y, 480.0, epsilon = 1e-9);
    }

    #[test]
    fn to_camera_inverts_to_court() {
        let t = build(tilted_corners()).expect("valid");
        let p = Point2::new(300.0, 250.0);
        let back = t.to_camera(t.to_court(p).expect("finite")).expect("finite");
        assert_abs_diff_eq!(back.x, p.x, epsilon = 1e-6);
        assert_abs_diff_eq!(back.y, p.y, epsilon = 1e-6);
    }

    #[test]
    fn coincident_corners_are_a_configuration_error() {
        let corners = CalibrationCorners::new([Point2::new(100.0, 100.0); 4]);
        assert!(matches!(
            build(corners),
            Err(ConfigError::DegenerateCorners { .. })
        ));
    }

    #[test]
    fn empty_sizes_are_rejected() {
        let err = CalibratedTransform::new(
            FrameSize::new(0, 480),
            FrameSize::new(640, 480),
            CourtSize::new(200.0, 150.0),
            tilted_corners(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptySize { what: "camera", .. }));
    }

    #[test]
    fn pose_heading_follows_axis_scaling() {
        // 640x480 -> 200x150 scales both axes by 0.3125, so angles survive.
        let t = build(CalibrationCorners::frame(FrameSize::new(640, 480))).expect("valid");
        let det = Detection {
            position: Point2::new(320.0, 240.0),
            area: 100,
            orientation: Some(std::f64::consts::FRAC_PI_4),
        };
        let pose = t.pose(Camp::A, &det).expect("pose");
        assert_eq!(pose.camp, Camp::A);
        assert_abs_diff_eq!(pose.position.x, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            pose.heading.expect("heading"),
            std::f64::consts::FRAC_PI_4,
            epsilon = 1e-9
        );

        let no_axis = Detection {
            orientation: None,
            ..det
        };
        assert_eq!(t.pose(Camp::B, &no_axis).expect("pose").heading, None);
    }
}
