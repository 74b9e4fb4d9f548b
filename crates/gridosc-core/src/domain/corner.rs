//! The grid corner reserved for the page-switch button.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a corner name is not one of the four known values.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown page corner '{0}' (expected top-left, top-right, bottom-left or bottom-right)")]
pub struct CornerParseError(pub String);

/// Which corner of the grid acts as the page-switch button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageCorner {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

impl PageCorner {
    /// Returns the `(x, y)` coordinate of this corner on a `width × height`
    /// grid.
    ///
    /// A device that reports a zero dimension (an arc reports `0 0`) maps
    /// every corner onto the origin rather than underflowing.
    pub fn switch_button(self, width: u32, height: u32) -> (u32, u32) {
        let right = width.saturating_sub(1);
        let bottom = height.saturating_sub(1);
        match self {
            PageCorner::TopLeft => (0, 0),
            PageCorner::TopRight => (right, 0),
            PageCorner::BottomLeft => (0, bottom),
            PageCorner::BottomRight => (right, bottom),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            PageCorner::TopLeft => "top-left",
            PageCorner::TopRight => "top-right",
            PageCorner::BottomLeft => "bottom-left",
            PageCorner::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for PageCorner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageCorner {
    type Err = CornerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "top-left" => Ok(PageCorner::TopLeft),
            "top-right" => Ok(PageCorner::TopRight),
            "bottom-left" => Ok(PageCorner::BottomLeft),
            "bottom-right" => Ok(PageCorner::BottomRight),
            _ => Err(CornerParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_button_for_each_corner_on_16x8() {
        assert_eq!(PageCorner::TopLeft.switch_button(16, 8), (0, 0));
        assert_eq!(PageCorner::TopRight.switch_button(16, 8), (15, 0));
        assert_eq!(PageCorner::BottomLeft.switch_button(16, 8), (0, 7));
        assert_eq!(PageCorner::BottomRight.switch_button(16, 8), (15, 7));
    }

    #[test]
    fn test_switch_button_on_zero_sized_device_does_not_underflow() {
        assert_eq!(PageCorner::BottomRight.switch_button(0, 0), (0, 0));
    }

    #[test]
    fn test_default_corner_is_top_right() {
        assert_eq!(PageCorner::default(), PageCorner::TopRight);
    }

    #[test]
    fn test_from_str_accepts_kebab_and_snake_case() {
        assert_eq!("bottom-left".parse(), Ok(PageCorner::BottomLeft));
        assert_eq!("Top_Left".parse(), Ok(PageCorner::TopLeft));
    }

    #[test]
    fn test_from_str_rejects_unknown_corner() {
        // Arrange / Act
        let result = "middle".parse::<PageCorner>();

        // Assert
        assert_eq!(result, Err(CornerParseError("middle".to_string())));
    }

    #[test]
    fn test_deserializes_from_kebab_case_toml() {
        // Arrange
        #[derive(Deserialize)]
        struct Wrapper {
            corner: PageCorner,
        }

        // Act
        let parsed: Wrapper = toml::from_str("corner = \"bottom-right\"").expect("parse");
        let rejected = toml::from_str::<Wrapper>("corner = \"middle\"");

        // Assert
        assert_eq!(parsed.corner, PageCorner::BottomRight);
        assert!(rejected.is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for corner in [
            PageCorner::TopLeft,
            PageCorner::TopRight,
            PageCorner::BottomLeft,
            PageCorner::BottomRight,
        ] {
            assert_eq!(corner.to_string().parse(), Ok(corner));
        }
    }
}
