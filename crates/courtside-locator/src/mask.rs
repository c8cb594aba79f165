use courtside_core::{rgb_to_hsv, Frame, LocatorConfig, Mask};

use crate::LocateError;

/// Check that a frame carries a color buffer of the advertised size.
pub(crate) fn check_frame(frame: &Frame) -> Result<[usize; 3], LocateError> {
    if frame.is_empty() {
        return Err(LocateError::EmptyFrame);
    }
    let Some(offsets) = frame.layout.rgb_offsets() else {
        return Err(LocateError::UnsupportedLayout(frame.layout));
    };
    let expected = frame.expected_len();
    if frame.data.len() != expected {
        return Err(LocateError::BufferSize {
            expected,
            got: frame.data.len(),
        });
    }
    Ok(offsets)
}

/// Threshold a color frame into a binary mask.
///
/// A pixel is set when its hue passes the circular hue test and its
/// saturation and value pass the linear tests.
pub fn threshold_mask(frame: &Frame, cfg: &LocatorConfig) -> Result<Mask, LocateError> {
    let [ro, go, bo] = check_frame(frame)?;
    let ch = frame.layout.channels();

    let mut mask = Mask::new(frame.width, frame.height);
    for (px, out) in frame.data.chunks_exact(ch).zip(mask.data.iter_mut()) {
        let [h, s, v] = rgb_to_hsv(px[ro], px[go], px[bo]);
        if cfg.accepts(h, s, v) {
            *out = Mask::ON;
        }
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtside_core::{PixelLayout, ThresholdRange};

    #[test]
    fn gray_frames_are_rejected() {
        let frame = Frame::new(2, 2, PixelLayout::Gray8, vec![0; 4]);
        let err = threshold_mask(&frame, &LocatorConfig::default()).unwrap_err();
        assert!(matches!(err, LocateError::UnsupportedLayout(PixelLayout::Gray8)));
    }

    #[test]
    fn short_buffers_are_rejected() {
        let frame = Frame::new(2, 2, PixelLayout::Rgb8, vec![0; 11]);
        let err = threshold_mask(&frame, &LocatorConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            LocateError::BufferSize {
                expected: 12,
                got: 11
            }
        ));
    }

    #[test]
    fn bgra_frames_threshold_like_rgb() {
        let cfg = LocatorConfig {
            hue: ThresholdRange::new(110, 130),
            saturation: ThresholdRange::new(100, 255),
            value: ThresholdRange::new(100, 255),
            ..LocatorConfig::default()
        };
        // blue, red
        let frame = Frame::new(2, 1, PixelLayout::Bgra8, vec![255, 0, 0, 255, 0, 0, 255, 255]);
        let mask = threshold_mask(&frame, &cfg).expect("mask");
        assert_eq!(mask.data, vec![Mask::ON, 0]);
    }
}
