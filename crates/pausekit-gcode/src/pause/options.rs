//! Pause configuration and machine capability facts

use pausekit_core::{to_mm_per_min, SpeedUnits};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::trigger::TriggerCondition;

/// What the pause is keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PauseAt {
    /// Print height above layer 0 (mm)
    #[default]
    Height,
    /// Layer number
    LayerNo,
}

impl fmt::Display for PauseAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Height => write!(f, "height"),
            Self::LayerNo => write!(f, "layer_no"),
        }
    }
}

impl FromStr for PauseAt {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "height" => Ok(Self::Height),
            "layer" | "layer_no" => Ok(Self::LayerNo),
            _ => Err(format!("Unknown pause trigger: {}", s)),
        }
    }
}

/// Content profile of the injected block
///
/// Both variants run the same phases; they differ in the move command used
/// for parking and in how the visible lift and the operator feedback are
/// arranged around the dwell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PauseVariant {
    /// G0 travel, lift then back to absolute before the feedback and dwell
    #[default]
    Standard,
    /// G1 travel, feedback before the lift, stays relative after the dwell
    AnycubicI3Mega,
}

impl fmt::Display for PauseVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::AnycubicI3Mega => write!(f, "anycubic_i3_mega"),
        }
    }
}

impl FromStr for PauseVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "anycubic_i3_mega" | "anycubic" => Ok(Self::AnycubicI3Mega),
            _ => Err(format!("Unknown pause variant: {}", s)),
        }
    }
}

/// User-facing pause options
///
/// Speeds are in `speed_units` (mm/s unless set) and converted to mm/min
/// when written out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PauseOptions {
    /// Height or layer trigger
    pub pause_at: PauseAt,
    /// Height above layer 0 at which to pause (mm)
    pub pause_height: f64,
    /// Layer number at which to pause, raft layers not counted
    pub pause_layer: i64,
    /// X the head parks at (mm)
    pub head_park_x: f64,
    /// Y the head parks at (mm)
    pub head_park_y: f64,
    /// Filament retracted at pause (mm)
    pub retraction_amount: f64,
    /// Retraction speed
    pub retraction_speed: f64,
    /// Filament extruded after the pause (mm)
    pub extrude_amount: f64,
    /// Extrusion speed after the pause
    pub extrude_speed: f64,
    /// Units of `retraction_speed` and `extrude_speed`
    pub speed_units: SpeedUnits,
    /// Number of preceding layers printed again after resume
    pub redo_layers: usize,
    /// Hotend temperature while paused (°C)
    pub standby_temperature: f64,
    /// Seconds the printer dwells waiting for the operator
    pub wait_seconds: u32,
    /// Message shown on the printer display, empty for none
    pub display_text: String,
    /// Play the long melody when pausing
    pub extended_feedback: bool,
    /// Block layout
    pub variant: PauseVariant,
}

impl Default for PauseOptions {
    fn default() -> Self {
        Self {
            pause_at: PauseAt::Height,
            pause_height: 5.0,
            pause_layer: 48,
            head_park_x: 190.0,
            head_park_y: 190.0,
            retraction_amount: 0.0,
            retraction_speed: 25.0,
            extrude_amount: 0.0,
            extrude_speed: 3.3333,
            speed_units: SpeedUnits::MmPerSec,
            redo_layers: 0,
            standby_temperature: 0.0,
            wait_seconds: 10,
            display_text: String::new(),
            extended_feedback: false,
            variant: PauseVariant::Standard,
        }
    }
}

impl PauseOptions {
    /// Pause at a height (mm) with default options otherwise
    pub fn at_height(height: f64) -> Self {
        Self {
            pause_at: PauseAt::Height,
            pause_height: height,
            ..Self::default()
        }
    }

    /// Pause at a layer with default options otherwise
    pub fn at_layer(layer: i64) -> Self {
        Self {
            pause_at: PauseAt::LayerNo,
            pause_layer: layer,
            ..Self::default()
        }
    }

    /// The trigger selected by `pause_at`
    pub fn trigger_condition(&self) -> TriggerCondition {
        match self.pause_at {
            PauseAt::Height => TriggerCondition::Height(self.pause_height),
            PauseAt::LayerNo => TriggerCondition::Layer(self.pause_layer),
        }
    }

    /// Retraction speed as a G-code feed rate (mm/min)
    pub fn retraction_feed(&self) -> f64 {
        to_mm_per_min(self.retraction_speed, self.speed_units)
    }

    /// Extrusion speed as a G-code feed rate (mm/min)
    pub fn extrude_feed(&self) -> f64 {
        to_mm_per_min(self.extrude_speed, self.speed_units)
    }

    /// Display text, if any
    pub fn display_text(&self) -> Option<&str> {
        let text = self.display_text.trim();
        (!text.is_empty()).then_some(text)
    }
}

/// Read-only facts about the printer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineCapabilities {
    /// Firmware supports G10/G11 retraction
    pub firmware_retract: bool,
    /// Hotend temperature is under G-code control
    pub nozzle_temp_enabled: bool,
    /// Height of the first layer (mm)
    pub initial_layer_height: f64,
}

impl Default for MachineCapabilities {
    fn default() -> Self {
        Self {
            firmware_retract: false,
            nozzle_temp_enabled: true,
            initial_layer_height: 0.3,
        }
    }
}
