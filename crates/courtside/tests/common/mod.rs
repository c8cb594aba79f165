#![allow(dead_code)]

use courtside::capture::{ReplayBackend, ReplayCamera};
use courtside::core::{CalibrationCorners, Frame, LocatorConfig, ThresholdRange};
use courtside::link::MemoryBackend;
use courtside::{Camp, FrameSize, SystemConfig};

pub const SIZE: FrameSize = FrameSize::new(64, 48);
pub const RED: [u8; 3] = [255, 0, 0];
pub const GREEN: [u8; 3] = [0, 255, 0];

/// Camp A's red blob covers [8, 16) x [8, 16); camp B's green one
/// [40, 50) x [30, 40).
pub fn court_frame() -> Frame {
    let mut frame = Frame::filled_rgb(SIZE.width as usize, SIZE.height as usize, [20, 20, 20]);
    frame.fill_rect_rgb(8, 8, 16, 16, RED);
    frame.fill_rect_rgb(40, 30, 50, 40, GREEN);
    frame
}

fn saturated(hue: ThresholdRange) -> LocatorConfig {
    LocatorConfig {
        hue,
        saturation: ThresholdRange::new(80, 255),
        value: ThresholdRange::new(60, 255),
        ..LocatorConfig::default()
    }
}

pub fn config(port_a: &str, port_b: &str) -> SystemConfig {
    let mut config = SystemConfig {
        frame_size: SIZE,
        monitor_size: SIZE,
        calibration: CalibrationCorners::frame(SIZE),
        ..SystemConfig::default()
    };
    config.vehicles[Camp::A].serial_port = port_a.into();
    config.vehicles[Camp::A].locator = saturated(ThresholdRange::new(170, 10));
    config.vehicles[Camp::B].serial_port = port_b.into();
    config.vehicles[Camp::B].locator = saturated(ThresholdRange::new(50, 70));
    config
}

pub fn replay() -> ReplayBackend {
    ReplayBackend::new().with_camera(0, ReplayCamera::new(vec![court_frame()]))
}

pub fn ports() -> MemoryBackend {
    MemoryBackend::new().with_port("ttyA").with_port("ttyB")
}
