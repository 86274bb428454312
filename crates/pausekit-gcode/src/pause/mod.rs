//! Pause-at-height engine
//!
//! Scans the layer sequence once, tracking machine state, until the trigger
//! condition is met. The trigger layer is then rewritten with a generated
//! block that parks the head, waits for the operator and restores the
//! pre-pause state. All other layers are returned as they came in.

pub mod feedback;
pub mod options;
pub mod resume;
pub mod splicer;
pub mod synthesizer;
pub mod trigger;

pub use feedback::{FeedbackSource, Melody, Silent};
pub use options::{MachineCapabilities, PauseAt, PauseOptions, PauseVariant};
pub use resume::{first_xy, last_extruder_position, Resolution, ResumePosition, ResumeResolver};
pub use splicer::splice;
pub use synthesizer::{Injection, InjectionSynthesizer, PauseWarning};
pub use trigger::{Evaluation, TriggerCondition, TriggerEvaluator, TriggerPoint};

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::gcode::{Instruction, LayerProcessor, MachineState, StateTracker};

/// Name the engine is registered under in a processor registry
pub const PROCESSOR_NAME: &str = "pause_at_height";

/// What was injected, and where
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InjectionReport {
    /// Position of the rewritten layer in the sequence
    pub layer_index: usize,
    pub trigger: TriggerPoint,
    pub resume: ResumePosition,
    pub redone_layers: usize,
    pub warnings: Vec<PauseWarning>,
}

/// Layers after a run, with the report when a pause was injected
#[derive(Debug, Clone, PartialEq)]
pub struct PauseOutcome {
    pub layers: Vec<String>,
    pub report: Option<InjectionReport>,
}

impl PauseOutcome {
    pub fn injected(&self) -> bool {
        self.report.is_some()
    }
}

/// Single-pause post-processor
#[derive(Clone)]
pub struct PauseAtHeight {
    options: PauseOptions,
    machine: MachineCapabilities,
    feedback: Arc<dyn FeedbackSource>,
}

impl std::fmt::Debug for PauseAtHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PauseAtHeight")
            .field("options", &self.options)
            .field("machine", &self.machine)
            .finish_non_exhaustive()
    }
}

impl PauseAtHeight {
    /// Create an engine that plays tone melodies
    pub fn new(options: PauseOptions, machine: MachineCapabilities) -> Self {
        Self {
            options,
            machine,
            feedback: Arc::new(Melody),
        }
    }

    /// Replace the operator feedback source
    pub fn with_feedback(mut self, feedback: Arc<dyn FeedbackSource>) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn options(&self) -> &PauseOptions {
        &self.options
    }

    pub fn machine(&self) -> &MachineCapabilities {
        &self.machine
    }

    /// Run the scan and inject at most one pause
    pub fn execute(&self, mut layers: Vec<String>) -> PauseOutcome {
        let condition = self.options.trigger_condition();
        debug!(layers = layers.len(), ?condition, "Scanning for pause trigger");

        let Some((index, trigger, state)) = self.find_trigger(&layers, condition) else {
            info!("Pause condition never met, output unchanged");
            return PauseOutcome {
                layers,
                report: None,
            };
        };

        let resolution = ResumeResolver::new(&layers).resolve(index, self.options.redo_layers);
        let synthesizer =
            InjectionSynthesizer::new(&self.options, &self.machine, self.feedback.as_ref());
        let injection = synthesizer.synthesize(&state, &trigger, &resolution);

        for warning in &injection.warnings {
            warn!(layer = index, "{}", warning);
        }

        splice(&mut layers, index, &injection.block, resolution.redo.clone());

        info!(
            layer = index,
            %trigger,
            redone = resolution.redone_layers(),
            "Injected pause"
        );

        PauseOutcome {
            layers,
            report: Some(InjectionReport {
                layer_index: index,
                trigger,
                resume: resolution.position,
                redone_layers: resolution.redone_layers(),
                warnings: injection.warnings,
            }),
        }
    }

    fn find_trigger(
        &self,
        layers: &[String],
        condition: TriggerCondition,
    ) -> Option<(usize, TriggerPoint, MachineState)> {
        let evaluator = TriggerEvaluator::new(condition, self.machine.initial_layer_height);
        let mut tracker = StateTracker::new();

        for (index, layer) in layers.iter().enumerate() {
            let mut skip_rest = false;

            for line in layer.lines() {
                let instruction = Instruction::parse(line);
                tracker.observe(&instruction);
                if skip_rest {
                    continue;
                }

                match evaluator.evaluate(tracker.state_mut(), &instruction) {
                    Evaluation::Pending => {}
                    Evaluation::SkipLayer => skip_rest = true,
                    Evaluation::Fire(trigger) => {
                        return Some((index, trigger, tracker.into_state()));
                    }
                }
            }
        }

        None
    }
}

impl LayerProcessor for PauseAtHeight {
    fn name(&self) -> &str {
        PROCESSOR_NAME
    }

    fn description(&self) -> &str {
        "Pauses the print at a height or layer so the operator can intervene"
    }

    fn process(&self, layers: Vec<String>) -> pausekit_core::Result<Vec<String>> {
        Ok(self.execute(layers).layers)
    }
}
