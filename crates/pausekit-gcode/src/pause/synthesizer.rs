//! Builds the G-code block injected at the pause point

use serde::Serialize;
use std::fmt;

use super::feedback::FeedbackSource;
use super::options::{MachineCapabilities, PauseOptions, PauseVariant};
use super::resume::Resolution;
use super::trigger::TriggerPoint;
use crate::gcode::{GcodeLine, MachineState};
use pausekit_core::format_number;

/// Lift above the print before parking (mm)
const PARK_LIFT: f64 = 1.0;
/// Z moves around the park position (mm/min)
const Z_FEED: f64 = 300.0;
/// XY travel to and from the park position (mm/min)
const TRAVEL_FEED: f64 = 9000.0;
/// Minimum nozzle clearance while parked (mm)
const MIN_CLEARANCE: f64 = 15.0;
/// Relative lift during the dwell (mm)
const VISIBLE_LIFT: f64 = 15.0;

/// Non-fatal problems found while building the block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseWarning {
    /// No extruding move with F seen before the trigger
    MissingFeedRate,
    /// No X/Y found to resume at; the head returns to 0,0
    MissingResumePosition,
    /// No extruder position found; E is reset to 0
    MissingExtruderPosition,
}

impl fmt::Display for PauseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFeedRate => write!(
                f,
                "No previous feedrate found, feedrate for next layer(s) might be incorrect"
            ),
            Self::MissingResumePosition => {
                write!(f, "No X/Y position found to resume at, using 0,0")
            }
            Self::MissingExtruderPosition => {
                write!(f, "No extruder position found before the pause, using E0")
            }
        }
    }
}

/// A synthesized block and the warnings raised while building it
#[derive(Debug, Clone, PartialEq)]
pub struct Injection {
    pub block: String,
    pub warnings: Vec<PauseWarning>,
}

/// Emits the pause block phase by phase
pub struct InjectionSynthesizer<'a> {
    options: &'a PauseOptions,
    machine: &'a MachineCapabilities,
    feedback: &'a dyn FeedbackSource,
}

impl<'a> InjectionSynthesizer<'a> {
    pub fn new(
        options: &'a PauseOptions,
        machine: &'a MachineCapabilities,
        feedback: &'a dyn FeedbackSource,
    ) -> Self {
        Self {
            options,
            machine,
            feedback,
        }
    }

    /// Build the block for a trigger.
    ///
    /// Device moves, retraction and temperature changes are left out
    /// entirely when the alternate flavor was detected.
    pub fn synthesize(
        &self,
        state: &MachineState,
        trigger: &TriggerPoint,
        resolution: &Resolution,
    ) -> Injection {
        let mut block = Block::default();
        let mut warnings = Vec::new();
        let device_moves = !state.is_alternate_flavor;

        self.header(&mut block, trigger);

        if device_moves {
            // only the device phases use the resolved position
            if !resolution.xy_found {
                warnings.push(PauseWarning::MissingResumePosition);
            }
            if !resolution.e_found {
                warnings.push(PauseWarning::MissingExtruderPosition);
            }

            block.push(GcodeLine::m(83).comment("relative E for retraction"));
            self.retract(&mut block);
            self.park(&mut block, state.current_z);
            if self.machine.nozzle_temp_enabled {
                block.push(
                    GcodeLine::m(104)
                        .s(self.options.standby_temperature)
                        .comment("standby temperature"),
                );
            }
        }

        if let Some(text) = self.options.display_text() {
            block.raw_line(&format!("M117 {}", text));
        }

        self.wait_for_operator(&mut block);

        if device_moves {
            if self.machine.nozzle_temp_enabled {
                let target = state.active_target_temperature().trunc();
                block.push(GcodeLine::m(109).s(target).comment("resume temperature"));
            }
            self.prime(&mut block);
            self.return_to_print(&mut block, state.current_z, resolution);
            self.unretract(&mut block);

            match state.current_feed_rate {
                Some(feed) => {
                    block.push(GcodeLine::g(1).f(feed).comment("restore extrusion feedrate"))
                }
                None => warnings.push(PauseWarning::MissingFeedRate),
            }

            block.push(GcodeLine::m(82).comment("absolute E"));
            block.push(
                GcodeLine::g(92)
                    .e(resolution.position.e)
                    .comment("reset extrusion to pre-pause value"),
            );
        }

        Injection {
            block: block.into_string(),
            warnings,
        }
    }

    fn header(&self, block: &mut Block, trigger: &TriggerPoint) {
        block.raw_line(";TYPE:CUSTOM");
        block.raw_line(";added code by post processing");
        block.raw_line(&format!(";script: pause_at_height ({})", self.options.variant));
        match trigger {
            TriggerPoint::Height { z, height } => {
                block.raw_line(&format!(";current z: {}", format_number(*z)));
                block.raw_line(&format!(";current height: {}", format_number(*height)));
            }
            TriggerPoint::Layer { index } => {
                block.raw_line(&format!(";current layer: {}", index));
            }
        }
    }

    fn travel(&self) -> GcodeLine {
        match self.options.variant {
            PauseVariant::Standard => GcodeLine::g(0),
            PauseVariant::AnycubicI3Mega => GcodeLine::g(1),
        }
    }

    fn firmware_retract_count(&self) -> usize {
        if self.machine.nozzle_temp_enabled {
            1
        } else {
            3
        }
    }

    fn retract(&self, block: &mut Block) {
        let amount = self.options.retraction_amount;
        if amount == 0.0 {
            return;
        }
        if self.machine.firmware_retract {
            for _ in 0..self.firmware_retract_count() {
                block.push(GcodeLine::g(10));
            }
        } else {
            block.push(GcodeLine::g(1).e(-amount).f(self.options.retraction_feed()));
        }
    }

    fn unretract(&self, block: &mut Block) {
        let amount = self.options.retraction_amount;
        if amount == 0.0 {
            return;
        }
        if self.machine.firmware_retract {
            for _ in 0..self.firmware_retract_count() {
                block.push(GcodeLine::g(11));
            }
        } else {
            block.push(GcodeLine::g(1).e(amount).f(self.options.retraction_feed()));
        }
    }

    fn park(&self, block: &mut Block, current_z: f64) {
        block.push(
            self.travel()
                .z(current_z + PARK_LIFT)
                .f(Z_FEED)
                .comment("lift off the print"),
        );
        block.push(
            self.travel()
                .x(self.options.head_park_x)
                .y(self.options.head_park_y)
                .f(TRAVEL_FEED)
                .comment("park nozzle"),
        );
        if current_z < MIN_CLEARANCE {
            block.push(
                self.travel()
                    .z(MIN_CLEARANCE)
                    .f(Z_FEED)
                    .comment("too close to bed, move to minimum clearance"),
            );
        }
    }

    fn wait_for_operator(&self, block: &mut Block) {
        let pause_signal = self.feedback.pause_signal(self.options.extended_feedback);
        let dwell = GcodeLine::g(4).s(f64::from(self.options.wait_seconds));

        match self.options.variant {
            PauseVariant::Standard => {
                block.push(GcodeLine::g(91).comment("relative movement"));
                block.push(GcodeLine::g(0).z(VISIBLE_LIFT).comment("lift to clear the print"));
                block.push(GcodeLine::g(90).comment("absolute movement"));
                block.raw(&pause_signal);
                block.push(dwell);
            }
            PauseVariant::AnycubicI3Mega => {
                block.raw(&pause_signal);
                block.push(GcodeLine::g(91));
                block.push(GcodeLine::g(91).z(VISIBLE_LIFT));
                block.push(dwell);
            }
        }

        block.raw(&self.feedback.resume_signal());
    }

    fn prime(&self, block: &mut Block) {
        let retraction = self.options.retraction_amount;
        let extrude = self.options.extrude_amount;

        // push-back keeps the positive sign
        if retraction != 0.0 {
            block.push(
                GcodeLine::g(1)
                    .e(retraction)
                    .f(self.options.retraction_feed())
                    .comment("push filament back"),
            );
        }
        if extrude != 0.0 {
            block.push(
                GcodeLine::g(1)
                    .e(extrude)
                    .f(self.options.extrude_feed())
                    .comment("extrude new filament"),
            );
        }
        if retraction != 0.0 {
            block.push(
                GcodeLine::g(1)
                    .e(-retraction)
                    .f(self.options.retraction_feed())
                    .comment("retract again before travel"),
            );
        }
    }

    fn return_to_print(&self, block: &mut Block, current_z: f64, resolution: &Resolution) {
        if current_z < MIN_CLEARANCE {
            block.push(
                self.travel()
                    .z(current_z + PARK_LIFT)
                    .f(Z_FEED)
                    .comment("move Z near print before moving X,Y"),
            );
        }
        block.push(
            self.travel()
                .x(resolution.position.x)
                .y(resolution.position.y)
                .f(TRAVEL_FEED)
                .comment("return to the original X,Y"),
        );
        block.push(
            self.travel()
                .z(current_z)
                .f(Z_FEED)
                .comment("back down to resume height"),
        );
    }
}

#[derive(Default)]
struct Block {
    text: String,
}

impl Block {
    fn push(&mut self, line: GcodeLine) {
        self.raw_line(&line.to_string());
    }

    fn raw_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }

    /// Append a payload that already carries its line endings
    fn raw(&mut self, payload: &str) {
        self.text.push_str(payload);
    }

    fn into_string(self) -> String {
        self.text
    }
}
