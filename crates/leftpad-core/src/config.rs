//! Per-session padding configuration.

use crate::error::{PadError, PadResult};
use serde::Deserialize;

/// Exclusive upper bound on the pad width.
pub const WIDTH_LIMIT: usize = 1024;

/// Default pad width (excluding the line terminator).
pub const DEFAULT_WIDTH: usize = 80;

/// Default fill byte.
pub const DEFAULT_FILL: u8 = b' ';

/// Default ring capacity in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Width and fill byte applied to every line of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_fill")]
    pub fill: u8,
}

impl SessionConfig {
    /// Build a validated config.
    pub fn new(width: usize, fill: u8) -> PadResult<Self> {
        let config = Self { width, fill };
        config.validate()?;
        Ok(config)
    }

    /// Reject widths at or above [`WIDTH_LIMIT`] and non-ASCII fill bytes.
    pub fn validate(&self) -> PadResult<()> {
        if self.width >= WIDTH_LIMIT {
            return Err(PadError::InvalidConfiguration(format!(
                "width {} must be below {WIDTH_LIMIT}",
                self.width
            )));
        }
        if !self.fill.is_ascii() {
            return Err(PadError::InvalidConfiguration(format!(
                "fill byte {:#04x} is not ASCII",
                self.fill
            )));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            fill: default_fill(),
        }
    }
}

fn default_width() -> usize {
    DEFAULT_WIDTH
}
fn default_fill() -> u8 {
    DEFAULT_FILL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SessionConfig::default();
        assert_eq!(config.width, 80);
        assert_eq!(config.fill, b' ');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn width_bounds() {
        assert!(SessionConfig::new(0, b'-').is_ok());
        assert!(SessionConfig::new(WIDTH_LIMIT - 1, b'-').is_ok());
        assert!(matches!(
            SessionConfig::new(WIDTH_LIMIT, b'-'),
            Err(PadError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn rejects_non_ascii_fill() {
        assert!(matches!(
            SessionConfig::new(10, 0xc3),
            Err(PadError::InvalidConfiguration(_))
        ));
    }
}
