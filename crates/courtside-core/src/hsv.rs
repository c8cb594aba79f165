//! 8-bit RGB to HSV conversion.
//!
//! Uses the half-degree hue convention common to camera tooling: hue in
//! `0..=179`, saturation and value in `0..=255`.

/// Largest representable hue value.
pub const HUE_MAX: u8 = 179;

#[inline]
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let v = max;
    if max == 0 {
        return [0, 0, 0];
    }

    let delta = (max - min) as f32;
    let s = (delta * 255.0 / max as f32).round() as u8;
    if max == min {
        return [0, s, v];
    }

    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let mut deg = if max == r {
        60.0 * (gf - bf) / delta
    } else if max == g {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    if deg < 0.0 {
        deg += 360.0;
    }

    let h = (deg * 0.5).round() as u16;
    [(h % (HUE_MAX as u16 + 1)) as u8, s, v]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_and_grays() {
        assert_eq!(rgb_to_hsv(255, 0, 0), [0, 255, 255]);
        assert_eq!(rgb_to_hsv(0, 255, 0), [60, 255, 255]);
        assert_eq!(rgb_to_hsv(0, 0, 255), [120, 255, 255]);
        assert_eq!(rgb_to_hsv(0, 255, 255), [90, 255, 255]);
        assert_eq!(rgb_to_hsv(128, 128, 128), [0, 0, 128]);
        assert_eq!(rgb_to_hsv(0, 0, 0), [0, 0, 0]);
    }

    #[test]
    fn reds_on_both_sides_of_zero() {
        assert_eq!(rgb_to_hsv(255, 42, 0)[0], 5);
        assert_eq!(rgb_to_hsv(255, 0, 42)[0], 175);
        assert_eq!(rgb_to_hsv(255, 0, 10)[0], 179);
        // Just under 360 degrees rounds onto the wrap point.
        assert_eq!(rgb_to_hsv(255, 0, 1)[0], 0);
    }
}
