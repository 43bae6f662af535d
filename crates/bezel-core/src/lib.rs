use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod color;
pub mod error;

pub use color::Rgba;
pub use error::NavigationError;

/// Index of a vertex in the input graph. Stable across layout updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub usize);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub usize);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a landmark (annotation) as assigned by whoever owns the landmark set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LandmarkId(pub u32);

impl fmt::Display for LandmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for enum conversion failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnumConversionError {
    #[error("Invalid FlightPreset value: {0}")]
    InvalidFlightPreset(i32),
    #[error("Invalid HullShape value: {0}")]
    InvalidHullShape(i32),
    #[error("Invalid key code: {0}")]
    InvalidKeyCode(i32),
}

/// Weighting preset used to build the flight map.
///
/// `Express` favours long hops on a minimum spanning tree; `Tourist` favours
/// well-connected vertices near landmarks on a maximum spanning tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(i32)]
pub enum FlightPreset {
    #[default]
    Express,
    Tourist,
}

impl FlightPreset {
    /// Default flight timer period for this preset, in milliseconds.
    pub fn timer_duration_ms(self) -> u32 {
        match self {
            FlightPreset::Express => 100,
            FlightPreset::Tourist => 125,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FlightPreset::Express => "express",
            FlightPreset::Tourist => "tourist",
        }
    }
}

impl TryFrom<i32> for FlightPreset {
    type Error = EnumConversionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FlightPreset::Express),
            1 => Ok(FlightPreset::Tourist),
            _ => Err(EnumConversionError::InvalidFlightPreset(value)),
        }
    }
}

impl std::str::FromStr for FlightPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "express" => Ok(FlightPreset::Express),
            "tourist" => Ok(FlightPreset::Tourist),
            other => Err(format!("unknown flight preset '{other}'")),
        }
    }
}

/// Shape drawn around a landmark's member vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(i32)]
pub enum HullShape {
    #[default]
    ConvexHull,
    BoundingRectangle,
}

impl TryFrom<i32> for HullShape {
    type Error = EnumConversionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(HullShape::ConvexHull),
            1 => Ok(HullShape::BoundingRectangle),
            _ => Err(EnumConversionError::InvalidHullShape(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_conversion() {
        assert_eq!(FlightPreset::try_from(0), Ok(FlightPreset::Express));
        assert_eq!(FlightPreset::try_from(1), Ok(FlightPreset::Tourist));
        assert_eq!(
            FlightPreset::try_from(7),
            Err(EnumConversionError::InvalidFlightPreset(7))
        );
        assert_eq!("Tourist".parse::<FlightPreset>(), Ok(FlightPreset::Tourist));
        assert!("scenic".parse::<FlightPreset>().is_err());
    }

    #[test]
    fn test_preset_timer_durations() {
        assert_eq!(FlightPreset::Express.timer_duration_ms(), 100);
        assert_eq!(FlightPreset::Tourist.timer_duration_ms(), 125);
    }

    #[test]
    fn test_hull_shape_conversion() {
        assert_eq!(HullShape::try_from(1), Ok(HullShape::BoundingRectangle));
        assert!(HullShape::try_from(-1).is_err());
    }
}
