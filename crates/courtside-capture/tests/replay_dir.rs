use courtside_capture::{FrameSource, ReplayBackend, ReplayCamera};
use courtside_core::{FrameSize, PixelLayout};

#[test]
fn frames_load_from_a_directory_in_name_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    for (name, red) in [("b.png", 200u8), ("a.png", 100u8)] {
        let img = image::RgbImage::from_pixel(8, 6, image::Rgb([red, 0, 0]));
        img.save(dir.path().join(name)).expect("write png");
    }
    std::fs::write(dir.path().join("notes.txt"), "ignored").expect("write txt");

    let camera = ReplayCamera::from_dir(dir.path()).expect("load").once();
    let backend = ReplayBackend::new().with_camera(0, camera);
    let mut source = FrameSource::open(&backend, 0, FrameSize::new(640, 480)).expect("open");

    assert_eq!(source.frame_size(), FrameSize::new(8, 6));
    let first = source.grab().expect("first");
    assert_eq!(first.layout, PixelLayout::Rgb8);
    assert_eq!(first.data[0], 100);
    assert_eq!(source.grab().expect("second").data[0], 200);
    assert!(source.grab().is_err());
}

#[test]
fn empty_directory_cannot_be_opened() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = ReplayBackend::new().with_camera(0, ReplayCamera::from_dir(dir.path()).expect("load"));
    assert!(FrameSource::open(&backend, 0, FrameSize::new(640, 480)).is_err());
}
