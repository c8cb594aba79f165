mod common;

use std::sync::Arc;
use std::time::Duration;

use courtside::capture::{CaptureError, ReplayCamera};
use courtside::core::{CalibrationCorners, ConfigError, ThresholdRange};
use courtside::link::{ChannelError, ChannelState};
use courtside::{
    Camp, FrameSize, ReconfigurationCoordinator, Resource, SharedPipeline, StepErrorKind,
};
use nalgebra::Point2;

use common::{config, ports, replay, SIZE};

fn coordinator(
    capture: courtside::capture::ReplayBackend,
    serial: courtside::link::MemoryBackend,
) -> (Arc<SharedPipeline>, ReconfigurationCoordinator) {
    let pipeline = Arc::new(SharedPipeline::new());
    let coordinator =
        ReconfigurationCoordinator::new(pipeline.clone(), Arc::new(capture), Arc::new(serial));
    (pipeline, coordinator)
}

#[test]
fn valid_snapshot_applies_every_step() {
    let (pipeline, coordinator) = coordinator(replay(), ports());
    let report = coordinator.apply(Arc::new(config("ttyA", "ttyB")));

    assert!(report.is_success(), "{:?}", report.errors());
    assert_eq!(report.camera.as_ref().ok(), Some(&SIZE));
    assert_eq!(report.channels.a.as_ref().ok(), Some(&ChannelState::Open));
    assert_eq!(report.channels.b.as_ref().ok(), Some(&ChannelState::Open));
    assert!(pipeline.has_source());
    assert_eq!(pipeline.transform().expect("transform").camera_size(), SIZE);
    assert!(pipeline.locator(Camp::A).config().hue.wraps());
    assert_eq!(pipeline.config().expect("snapshot").camera, 0);
}

#[test]
fn missing_port_for_one_camp_leaves_the_other_open() {
    let serial = ports();
    let (pipeline, coordinator) = coordinator(replay(), serial.clone());
    let report = coordinator.apply(Arc::new(config("ttyA", "ttyB-missing")));

    assert_eq!(pipeline.channel_state(Camp::A), ChannelState::Open);
    assert_eq!(pipeline.channel_state(Camp::B), ChannelState::Closed);
    let errors = report.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].camp, Some(Camp::B));
    assert_eq!(errors[0].resource, Resource::Channel);
    assert!(matches!(
        errors[0].kind,
        StepErrorKind::Channel(ChannelError::NotFound { .. })
    ));
    assert!(errors[0].to_string().starts_with("camp B channel"));
    assert!(serial.is_claimed("ttyA"));
}

#[test]
fn empty_port_is_a_disabled_camp_not_an_error() {
    let (pipeline, coordinator) = coordinator(replay(), ports());
    let report = coordinator.apply(Arc::new(config("", "ttyB")));

    assert!(report.is_success(), "{:?}", report.errors());
    assert_eq!(report.channels.a.as_ref().ok(), Some(&ChannelState::Closed));
    assert_eq!(pipeline.channel_state(Camp::A), ChannelState::Closed);
    assert_eq!(pipeline.channel_state(Camp::B), ChannelState::Open);
}

#[test]
fn reapplying_reopens_the_same_ports() {
    let serial = ports();
    let (pipeline, coordinator) = coordinator(replay(), serial.clone());
    let snapshot = Arc::new(config("ttyA", "ttyB"));
    assert!(coordinator.apply(snapshot.clone()).is_success());
    let report = coordinator.apply(snapshot);

    assert!(report.is_success(), "{:?}", report.errors());
    assert_eq!(pipeline.channel_state(Camp::A), ChannelState::Open);
    assert_eq!(serial.open_attempts(), 4);
}

#[test]
fn degenerate_calibration_keeps_the_previous_transform() {
    let (pipeline, coordinator) = coordinator(replay(), ports());
    assert!(coordinator.apply(Arc::new(config("ttyA", "ttyB"))).is_success());
    let before = pipeline.transform().expect("transform");

    let mut bad = config("ttyA", "ttyB");
    bad.calibration = CalibrationCorners::new([Point2::new(10.0, 10.0); 4]);
    let report = coordinator.apply(Arc::new(bad));

    let err = report.transform.as_ref().expect_err("degenerate corners");
    assert_eq!(err.camp, None);
    assert!(matches!(
        err.kind,
        StepErrorKind::Config(ConfigError::DegenerateCorners { .. })
    ));
    assert_eq!(report.errors().len(), 1);
    assert!(Arc::ptr_eq(&before, &pipeline.transform().expect("kept")));
    assert_eq!(pipeline.channel_state(Camp::B), ChannelState::Open);
}

#[test]
fn unavailable_camera_keeps_the_current_source() {
    let capture = replay();
    let (pipeline, coordinator) = coordinator(capture, ports());
    assert!(coordinator.apply(Arc::new(config("ttyA", "ttyB"))).is_success());

    let mut moved = config("ttyA", "ttyB");
    moved.camera = 5;
    let report = coordinator.apply(Arc::new(moved));

    assert!(matches!(
        report.camera.as_ref().map_err(|e| &e.kind),
        Err(StepErrorKind::Device(CaptureError::Unavailable { index: 5 }))
    ));
    assert_eq!(pipeline.camera_index(), Some(0));
    assert!(report.transform.is_ok());
}

#[test]
fn failed_open_leaves_no_source_and_reuses_the_last_size() {
    let capture = replay().with_camera(1, ReplayCamera::new(Vec::new()));
    let (pipeline, coordinator) = coordinator(capture, ports());
    assert!(coordinator.apply(Arc::new(config("ttyA", "ttyB"))).is_success());

    let mut broken = config("ttyA", "ttyB");
    broken.camera = 1;
    broken.frame_size = FrameSize::new(1920, 1080);
    let report = coordinator.apply(Arc::new(broken));

    assert!(matches!(
        report.camera.as_ref().map_err(|e| &e.kind),
        Err(StepErrorKind::Device(CaptureError::Open { index: 1, .. }))
    ));
    assert!(!pipeline.has_source());
    assert_eq!(pipeline.transform().expect("transform").camera_size(), SIZE);
}

#[test]
fn bad_locator_is_isolated_to_its_camp() {
    let (pipeline, coordinator) = coordinator(replay(), ports());
    assert!(coordinator.apply(Arc::new(config("ttyA", "ttyB"))).is_success());
    let kept = pipeline.locator(Camp::B);

    let mut bad = config("ttyA", "ttyB");
    bad.vehicles[Camp::A].locator.min_area = 5;
    bad.vehicles[Camp::B].locator.saturation = ThresholdRange::new(200, 10);
    let report = coordinator.apply(Arc::new(bad));

    assert!(report.locators.a.is_ok());
    let err = report.locators.b.as_ref().expect_err("inverted saturation");
    assert!(matches!(
        err.kind,
        StepErrorKind::Config(ConfigError::EmptyRange {
            camp: Some(Camp::B),
            ..
        })
    ));
    assert_eq!(pipeline.locator(Camp::A).config().min_area, 5);
    assert!(Arc::ptr_eq(&kept, &pipeline.locator(Camp::B)));
    assert_eq!(report.camp_errors(Camp::A).len(), 0);
}

#[test]
fn spawn_apply_delivers_the_report() {
    let pipeline = Arc::new(SharedPipeline::new());
    let coordinator = Arc::new(ReconfigurationCoordinator::new(
        pipeline.clone(),
        Arc::new(replay()),
        Arc::new(ports()),
    ));
    let report = coordinator
        .spawn_apply(Arc::new(config("ttyA", "")))
        .recv_timeout(Duration::from_secs(5))
        .expect("report");
    assert!(report.is_success());
    let summary = report.summary();
    assert!(summary.ok);
    assert_eq!(summary.channels.a.as_deref(), Some("open"));
    assert_eq!(summary.channels.b.as_deref(), Some("closed"));
    assert_eq!(pipeline.channel_state(Camp::A), ChannelState::Open);
}
