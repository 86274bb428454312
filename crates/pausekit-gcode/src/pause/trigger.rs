//! Pause trigger evaluation

use serde::Serialize;
use std::fmt;

use crate::gcode::{Instruction, LayerMarker, MachineState};

/// Resolved trigger threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerCondition {
    /// Fire at the first motion at or above this height (mm)
    Height(f64),
    /// Fire at the first marker at or above this layer, rafts excluded
    Layer(i64),
}

/// Where the pause fired
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TriggerPoint {
    Height { z: f64, height: f64 },
    Layer { index: i64 },
}

impl fmt::Display for TriggerPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Height { z, height } => write!(f, "height {} (z {})", height, z),
            Self::Layer { index } => write!(f, "layer {}", index),
        }
    }
}

/// Outcome of evaluating one instruction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// Not a candidate; keep going
    Pending,
    /// Candidate below threshold; no further attempts in this layer
    SkipLayer,
    /// Trigger satisfied
    Fire(TriggerPoint),
}

/// Decides whether the pause condition is newly satisfied
///
/// Height mode looks only at G0/G1 and gives up on the rest of a layer as
/// soon as one move is below the threshold. Layer mode looks only at
/// `;LAYER:` markers, skipping malformed ones, and keeps scanning.
#[derive(Debug, Clone)]
pub struct TriggerEvaluator {
    condition: TriggerCondition,
    initial_layer_height: f64,
}

impl TriggerEvaluator {
    pub fn new(condition: TriggerCondition, initial_layer_height: f64) -> Self {
        Self {
            condition,
            initial_layer_height,
        }
    }

    /// Evaluate an instruction already applied to `state`.
    ///
    /// Never fires before layer 0 has started.
    pub fn evaluate(&self, state: &mut MachineState, instruction: &Instruction<'_>) -> Evaluation {
        if !state.layers_started {
            return Evaluation::Pending;
        }

        match self.condition {
            TriggerCondition::Height(pause_height) => {
                if !instruction.is_motion() {
                    return Evaluation::Pending;
                }
                state.freeze_layer_zero(self.initial_layer_height);
                let height = state.update_height();
                if height < pause_height {
                    Evaluation::SkipLayer
                } else {
                    Evaluation::Fire(TriggerPoint::Height {
                        z: state.current_z,
                        height,
                    })
                }
            }
            TriggerCondition::Layer(pause_layer) => match instruction.layer_marker() {
                Some(LayerMarker::Index(index))
                    if index >= pause_layer - i64::from(state.negative_layer_count) =>
                {
                    Evaluation::Fire(TriggerPoint::Layer { index })
                }
                _ => Evaluation::Pending,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcode::StateTracker;

    fn run(evaluator: &TriggerEvaluator, lines: &[&str]) -> Vec<Evaluation> {
        let mut tracker = StateTracker::new();
        lines
            .iter()
            .map(|line| {
                let ins = Instruction::parse(line);
                tracker.observe(&ins);
                evaluator.evaluate(tracker.state_mut(), &ins)
            })
            .collect()
    }

    #[test]
    fn test_never_fires_before_layer_zero() {
        let evaluator = TriggerEvaluator::new(TriggerCondition::Height(0.0), 0.3);
        let results = run(&evaluator, &["G1 Z10", ";LAYER:-1", "G1 Z12"]);
        assert!(results.iter().all(|r| *r == Evaluation::Pending));
    }

    #[test]
    fn test_height_datum() {
        let evaluator = TriggerEvaluator::new(TriggerCondition::Height(5.0), 0.2);
        let mut tracker = StateTracker::new();
        for line in [";LAYER:0", "G0 Z5.0"] {
            let ins = Instruction::parse(line);
            tracker.observe(&ins);
            let result = evaluator.evaluate(tracker.state_mut(), &ins);
            if line.starts_with('G') {
                assert_eq!(result, Evaluation::SkipLayer);
            }
        }
        let state = tracker.state();
        assert!((state.layer_zero_z.unwrap() - 4.8).abs() < 1e-9);
        assert!((state.current_height - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_height_fires_when_reached() {
        let evaluator = TriggerEvaluator::new(TriggerCondition::Height(0.1), 0.2);
        let results = run(&evaluator, &[";LAYER:0", "M107", "G0 Z5.0"]);
        assert_eq!(results[1], Evaluation::Pending);
        match results[2] {
            Evaluation::Fire(TriggerPoint::Height { z, height }) => {
                assert_eq!(z, 5.0);
                assert!((height - 0.2).abs() < 1e-9);
            }
            other => panic!("expected fire, got {:?}", other),
        }
    }

    #[test]
    fn test_layer_threshold_with_raft() {
        let evaluator = TriggerEvaluator::new(TriggerCondition::Layer(3), 0.3);
        let results = run(
            &evaluator,
            &[";LAYER:-2", ";LAYER:-1", ";LAYER:0", ";LAYER:1"],
        );
        assert_eq!(results[2], Evaluation::Pending);
        assert_eq!(results[3], Evaluation::Fire(TriggerPoint::Layer { index: 1 }));
    }

    #[test]
    fn test_layer_malformed_marker_skipped() {
        let evaluator = TriggerEvaluator::new(TriggerCondition::Layer(1), 0.3);
        let results = run(&evaluator, &[";LAYER:0", ";LAYER:oops", ";LAYER:1"]);
        assert_eq!(results[1], Evaluation::Pending);
        assert_eq!(results[2], Evaluation::Fire(TriggerPoint::Layer { index: 1 }));
    }

    #[test]
    fn test_trigger_point_display() {
        assert_eq!(TriggerPoint::Layer { index: 4 }.to_string(), "layer 4");
        assert_eq!(
            TriggerPoint::Height { z: 5.3, height: 5.0 }.to_string(),
            "height 5 (z 5.3)"
        );
    }
}
