//! Pose line format.
//!
//! One pose per line, ASCII:
//!
//! ```text
//! A:123.4,56.7,90.0\n
//! B:10.0,20.0,\n
//! ```
//!
//! Camp tag, court x and y, then the heading in degrees. The heading field is
//! empty when the locator could not estimate one.

use courtside_core::{Camp, Pose};
use nalgebra::Point2;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("pose line is not newline terminated")]
    Unterminated,
    #[error("pose line is not valid ASCII")]
    NotAscii,
    #[error("unknown camp tag {0:?}")]
    UnknownCamp(String),
    #[error("expected 3 comma separated fields, got {0}")]
    FieldCount(usize),
    #[error("bad {field} value {value:?}")]
    BadNumber { field: &'static str, value: String },
}

/// Encode `pose` as one newline-terminated line.
pub fn encode_pose(pose: &Pose) -> Vec<u8> {
    let tag = pose.camp.tag() as char;
    let heading = pose
        .heading
        .map(|h| format!("{:.1}", h.to_degrees()))
        .unwrap_or_default();
    format!(
        "{tag}:{:.1},{:.1},{heading}\n",
        pose.position.x, pose.position.y
    )
    .into_bytes()
}

/// Parse one line produced by [`encode_pose`].
pub fn decode_pose(line: &[u8]) -> Result<Pose, WireError> {
    let line = line.strip_suffix(b"\n").ok_or(WireError::Unterminated)?;
    let line = std::str::from_utf8(line)
        .ok()
        .filter(|s| s.is_ascii())
        .ok_or(WireError::NotAscii)?;
    let line = line.strip_suffix('\r').unwrap_or(line);

    let (tag, body) = line
        .split_once(':')
        .ok_or_else(|| WireError::UnknownCamp(line.to_owned()))?;
    let camp = match tag.as_bytes() {
        [t] => Camp::from_tag(*t),
        _ => None,
    }
    .ok_or_else(|| WireError::UnknownCamp(tag.to_owned()))?;

    let fields: Vec<&str> = body.split(',').collect();
    let [x, y, heading] = fields[..] else {
        return Err(WireError::FieldCount(fields.len()));
    };
    let heading = if heading.is_empty() {
        None
    } else {
        Some(number("heading", heading)?.to_radians())
    };
    Ok(Pose {
        camp,
        position: Point2::new(number("x", x)?, number("y", y)?),
        heading,
    })
}

fn number(field: &'static str, value: &str) -> Result<f64, WireError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| WireError::BadNumber {
            field,
            value: value.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn encodes_one_decimal_and_degrees() {
        let pose = Pose {
            camp: Camp::A,
            position: Point2::new(100.04, 75.0),
            heading: Some(FRAC_PI_2),
        };
        assert_eq!(encode_pose(&pose), b"A:100.0,75.0,90.0\n");
    }

    #[test]
    fn unknown_heading_is_an_empty_field() {
        let pose = Pose {
            camp: Camp::B,
            position: Point2::new(-3.26, 12.0),
            heading: None,
        };
        let line = encode_pose(&pose);
        assert_eq!(line, b"B:-3.3,12.0,\n");
        let back = decode_pose(&line).expect("decode");
        assert_eq!(back.camp, Camp::B);
        assert_eq!(back.heading, None);
        assert_relative_eq!(back.position.y, 12.0);
    }

    #[test]
    fn decode_accepts_crlf() {
        let pose = decode_pose(b"A:1.5,2.5,-45.0\r\n").expect("decode");
        assert_relative_eq!(pose.heading.unwrap(), -std::f64::consts::FRAC_PI_4, epsilon = 1e-12);
    }

    #[test]
    fn malformed_lines() {
        assert_eq!(decode_pose(b"A:1,2,3"), Err(WireError::Unterminated));
        assert_eq!(
            decode_pose(b"C:1,2,3\n"),
            Err(WireError::UnknownCamp("C".into()))
        );
        assert_eq!(decode_pose(b"A:1,2\n"), Err(WireError::FieldCount(2)));
        assert!(matches!(
            decode_pose(b"A:1,nan,\n"),
            Err(WireError::BadNumber { field: "y", .. })
        ));
    }
}
