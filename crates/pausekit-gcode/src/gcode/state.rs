//! Machine state tracking over a G-code stream

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use super::{CommandKind, Instruction, LayerMarker};

/// Flavor whose firmware parks and pauses on its own
pub const ALTERNATE_FLAVOR: &str = "Griffin";

/// Accumulated effect of every instruction seen so far
///
/// Tracks what the pause block needs to restore after the operator resumes:
/// - Z position and the height datum of layer 0
/// - Layer counters, including raft layers below layer 0
/// - Active tool and per-tool target temperature
/// - Feed rate of the last extruding move
/// - Firmware flavor
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MachineState {
    /// Last seen Z (mm)
    pub current_z: f64,

    /// Z of layer 0 minus the first layer height; computed once
    pub layer_zero_z: Option<f64>,

    /// `current_z - layer_zero_z`, maintained in height mode only
    pub current_height: f64,

    /// Index of the last numeric layer marker
    pub current_layer_index: i64,

    /// Number of raft layers (negative markers) seen
    pub negative_layer_count: u32,

    /// Last selected tool
    pub active_tool: i64,

    /// Last commanded target temperature per tool
    pub target_temperature: BTreeMap<i64, f64>,

    /// F of the last move that also extruded
    pub current_feed_rate: Option<f64>,

    /// Set for good once the alternate flavor marker is seen
    pub is_alternate_flavor: bool,

    /// Set by the layer 0 marker
    pub layers_started: bool,
}

impl MachineState {
    /// Create a new machine state with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze the layer 0 datum on first call and return it.
    ///
    /// Later calls return the frozen value regardless of `current_z`.
    pub fn freeze_layer_zero(&mut self, initial_layer_height: f64) -> f64 {
        match self.layer_zero_z {
            Some(z) => z,
            None => {
                let z = self.current_z - initial_layer_height;
                debug!(layer_zero_z = z, "Layer 0 datum fixed");
                self.layer_zero_z = Some(z);
                z
            }
        }
    }

    /// Recompute `current_height` from the frozen datum
    pub fn update_height(&mut self) -> f64 {
        self.current_height = self.current_z - self.layer_zero_z.unwrap_or(0.0);
        self.current_height
    }

    /// Target temperature recorded for the active tool, 0 if none
    pub fn active_target_temperature(&self) -> f64 {
        self.target_temperature
            .get(&self.active_tool)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Folds instructions into a [`MachineState`]
///
/// Checks run in a fixed order and are independent; one instruction may
/// update several fields.
#[derive(Debug, Default)]
pub struct StateTracker {
    state: MachineState,
}

impl StateTracker {
    /// Create a tracker with a fresh state
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Mutable state, for the trigger evaluator's height bookkeeping
    pub fn state_mut(&mut self) -> &mut MachineState {
        &mut self.state
    }

    /// Consume the tracker and return the state
    pub fn into_state(self) -> MachineState {
        self.state
    }

    /// Apply one instruction
    pub fn observe(&mut self, instruction: &Instruction<'_>) {
        let state = &mut self.state;

        if instruction.flavor() == Some(ALTERNATE_FLAVOR) && !state.is_alternate_flavor {
            debug!("Alternate flavor detected, device moves will be suppressed");
            state.is_alternate_flavor = true;
        }

        if let Some(LayerMarker::Index(index)) = instruction.layer_marker() {
            state.current_layer_index = index;
            if index == 0 {
                state.layers_started = true;
            } else if index < 0 {
                state.negative_layer_count += 1;
            }
        }

        if instruction.kind() == CommandKind::ToolSelect {
            if let Some(tool) = instruction.value('T') {
                state.active_tool = tool as i64;
            }
        }

        if matches!(
            instruction.kind(),
            CommandKind::SetTemperature | CommandKind::SetTemperatureAndWait
        ) {
            if let Some(target) = instruction.value('S') {
                let tool = instruction
                    .value('T')
                    .map(|t| t as i64)
                    .unwrap_or(state.active_tool);
                state.target_temperature.insert(tool, target);
            }
        }

        if !state.layers_started {
            return;
        }

        // travel moves carry F without E and must not count
        if instruction.has('E') {
            if let Some(feed) = instruction.value('F') {
                state.current_feed_rate = Some(feed);
            }
        }

        if let Some(z) = instruction.value('Z') {
            state.current_z = z;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(lines: &[&str]) -> MachineState {
        let mut tracker = StateTracker::new();
        for line in lines {
            tracker.observe(&Instruction::parse(line));
        }
        tracker.into_state()
    }

    #[test]
    fn test_defaults() {
        let state = MachineState::new();
        assert_eq!(state.active_tool, 0);
        assert!(!state.layers_started);
        assert!(!state.is_alternate_flavor);
        assert_eq!(state.current_feed_rate, None);
        assert_eq!(state.active_target_temperature(), 0.0);
    }

    #[test]
    fn test_temperature_tracking_per_tool() {
        let state = track(&["M104 S200", "T1", "M109 S215", "M104 T0 S190"]);
        assert_eq!(state.active_tool, 1);
        assert_eq!(state.target_temperature.get(&0), Some(&190.0));
        assert_eq!(state.target_temperature.get(&1), Some(&215.0));
        assert_eq!(state.active_target_temperature(), 215.0);
    }

    #[test]
    fn test_temperature_without_s_ignored() {
        let state = track(&["M104 T0"]);
        assert!(state.target_temperature.is_empty());
    }

    #[test]
    fn test_position_and_feed_only_after_layers_start() {
        let state = track(&["G1 Z0.3 F1200 E1", ";LAYER:0", "G0 Z0.5 F9000"]);
        assert_eq!(state.current_z, 0.5);
        assert_eq!(state.current_feed_rate, None);

        let state = track(&[";LAYER:0", "G1 X1 Y1 E0.5 F1500", "G0 F9000 X5"]);
        assert_eq!(state.current_feed_rate, Some(1500.0));
    }

    #[test]
    fn test_layer_counters() {
        let state = track(&[";LAYER:-2", ";LAYER:-1", ";LAYER:0", ";LAYER:1"]);
        assert_eq!(state.negative_layer_count, 2);
        assert_eq!(state.current_layer_index, 1);
        assert!(state.layers_started);
    }

    #[test]
    fn test_flavor_is_sticky() {
        let state = track(&[";FLAVOR:Griffin", ";FLAVOR:Marlin"]);
        assert!(state.is_alternate_flavor);

        let state = track(&[";FLAVOR:Marlin"]);
        assert!(!state.is_alternate_flavor);
    }

    #[test]
    fn test_layer_zero_frozen_once() {
        let mut state = MachineState::new();
        state.current_z = 5.0;
        assert!((state.freeze_layer_zero(0.2) - 4.8).abs() < 1e-9);
        state.current_z = 7.0;
        assert!((state.freeze_layer_zero(0.2) - 4.8).abs() < 1e-9);
        assert!((state.update_height() - 2.2).abs() < 1e-9);
    }
}
