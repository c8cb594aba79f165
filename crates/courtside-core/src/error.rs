use crate::Camp;

/// Rejected configuration values.
///
/// These are operator-facing: the caller keeps whatever it had before and
/// reports the message.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("calibration corners are degenerate: {reason}")]
    DegenerateCorners { reason: &'static str },

    #[error("calibration homography is singular")]
    SingularHomography,

    #[error("{what} size must be positive (got {width}x{height})")]
    EmptySize {
        what: &'static str,
        width: f64,
        height: f64,
    },

    #[error("{}: {channel} range [{min}, {max}] is empty", MaybeCamp(.camp))]
    EmptyRange {
        camp: Option<Camp>,
        channel: &'static str,
        min: u8,
        max: u8,
    },

    #[error("{}: hue bound {value} is outside 0..={}", MaybeCamp(.camp), crate::HUE_MAX)]
    HueOutOfDomain { camp: Option<Camp>, value: u8 },

    #[error("{camp}: baud rate must be positive")]
    ZeroBaudRate { camp: Camp },
}

impl ConfigError {
    /// Attach a camp to range errors raised by camp-agnostic validation.
    pub fn for_camp(self, camp: Camp) -> Self {
        match self {
            ConfigError::EmptyRange {
                channel, min, max, ..
            } => ConfigError::EmptyRange {
                camp: Some(camp),
                channel,
                min,
                max,
            },
            ConfigError::HueOutOfDomain { value, .. } => ConfigError::HueOutOfDomain {
                camp: Some(camp),
                value,
            },
            other => other,
        }
    }
}

/// Formats an optional camp for error messages.
pub(crate) struct MaybeCamp<'a>(pub &'a Option<Camp>);

impl std::fmt::Display for MaybeCamp<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self.0 {
            Some(camp) => write!(f, "{camp}"),
            None => f.write_str("locator"),
        }
    }
}
