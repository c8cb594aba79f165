mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use courtside::capture::{ReplayBackend, ReplayCamera};
use courtside::link::{decode_pose, ChannelState, MemoryBackend};
use courtside::{Camp, DetectionLoop, LoopError, ReconfigurationCoordinator, SharedPipeline};

use common::{config, court_frame};

fn wait_for(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn loop_keeps_running_while_ports_are_swapped() {
    let serial = MemoryBackend::new()
        .with_port("ttyA")
        .with_port("ttyB")
        .with_port("ttyC");
    let camera = ReplayCamera::new(vec![court_frame()]).with_interval(Duration::from_millis(2));
    let pipeline = Arc::new(SharedPipeline::new());
    let coordinator = Arc::new(ReconfigurationCoordinator::new(
        pipeline.clone(),
        Arc::new(ReplayBackend::new().with_camera(0, camera)),
        Arc::new(serial.clone()),
    ));
    assert!(coordinator.apply(Arc::new(config("ttyA", "ttyB"))).is_success());

    let detection = DetectionLoop::new(pipeline.clone()).with_idle_interval(Duration::from_millis(1));
    let stop = detection.stop_flag();
    let handle = detection.spawn();
    assert!(wait_for(|| !serial.written("ttyB").is_empty()));

    for round in 0..20 {
        let port_a = if round % 2 == 0 { "ttyC" } else { "ttyA" };
        let report = coordinator
            .spawn_apply(Arc::new(config(port_a, "ttyB")))
            .recv_timeout(Duration::from_secs(5))
            .expect("report");
        assert!(report.is_success(), "round {round}: {:?}", report.errors());
        assert_eq!(pipeline.channel_state(Camp::A), ChannelState::Open);
        assert_eq!(pipeline.channel_state(Camp::B), ChannelState::Open);
        std::thread::sleep(Duration::from_millis(3));
    }

    // Last round moved camp A to ttyA; put it on ttyC and watch poses arrive.
    assert!(coordinator.apply(Arc::new(config("ttyC", "ttyB"))).is_success());
    serial.take_written("ttyC");
    let before_b = serial.written("ttyB").len();
    let after_swap = serial.written("ttyA").len();
    assert!(wait_for(|| serial.written("ttyC").len() >= 3 * 12));
    assert!(serial.written("ttyB").len() > before_b);
    assert_eq!(serial.written("ttyA").len(), after_swap);

    let lines = serial.written("ttyC");
    let first = lines
        .split_inclusive(|b| *b == b'\n')
        .next()
        .expect("one line");
    assert_eq!(decode_pose(first).expect("well-formed").camp, Camp::A);

    stop.raise();
    let stats = handle.join().expect("join").expect("loop");
    assert!(stats.frames > 0);
    assert!(stats.poses_sent > 0);
}

#[test]
fn lost_camera_is_reported_by_its_own_index() {
    let serial = MemoryBackend::new().with_port("ttyA").with_port("ttyB");
    let pipeline = Arc::new(SharedPipeline::new());
    let coordinator = ReconfigurationCoordinator::new(
        pipeline.clone(),
        Arc::new(ReplayBackend::new().with_camera(3, ReplayCamera::new(vec![court_frame()]).once())),
        Arc::new(serial),
    );
    let mut cfg = config("ttyA", "ttyB");
    cfg.camera = 3;
    assert!(coordinator.apply(Arc::new(cfg)).is_success());

    let (index, first) = pipeline.grab().expect("source");
    assert_eq!(index, 3);
    assert!(first.is_ok());

    let err = DetectionLoop::new(pipeline.clone()).run().expect_err("replay ends");
    assert!(matches!(err, LoopError::DeviceLost { camera: 3, .. }));
    assert!(pipeline.grab().is_none());
}
