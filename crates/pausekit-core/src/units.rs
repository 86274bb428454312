//! Unit conversion utilities
//!
//! Slicer settings express extrusion speeds in mm/s while G-code `F` words
//! are mm/min. Numbers written back into G-code go through [`format_number`]
//! so generated lines are stable across platforms.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decimal places kept when writing numbers into G-code.
const GCODE_PRECISION: i32 = 5;

/// Speed units selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeedUnits {
    /// Millimeters per minute
    MmPerMin,
    /// Millimeters per second
    #[default]
    MmPerSec,
}

impl fmt::Display for SpeedUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MmPerMin => write!(f, "mm/min"),
            Self::MmPerSec => write!(f, "mm/s"),
        }
    }
}

impl FromStr for SpeedUnits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mm/min" | "mm_per_min" => Ok(Self::MmPerMin),
            "mm/s" | "mm/sec" | "mm_per_sec" => Ok(Self::MmPerSec),
            _ => Err(format!("Unknown speed units: {}", s)),
        }
    }
}

/// Convert a speed to the mm/min value used by G-code `F` words
pub fn to_mm_per_min(value: f64, units: SpeedUnits) -> f64 {
    match units {
        SpeedUnits::MmPerMin => value,
        SpeedUnits::MmPerSec => value * 60.0,
    }
}

/// Format a number for a G-code word
///
/// Rounds to five decimal places and drops trailing zeros, so `1500.0`
/// becomes `1500`, `12.5` stays `12.5` and `0.1 + 0.2` becomes `0.3`.
pub fn format_number(value: f64) -> String {
    let multiplier = 10_f64.powi(GCODE_PRECISION);
    let rounded = (value * multiplier).round() / multiplier;
    // avoid emitting "-0"
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{}", rounded)
}
