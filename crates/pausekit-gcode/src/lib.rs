//! # pausekit G-code
//!
//! G-code instruction model, machine state tracking, the layer processor
//! pipeline and the pause-at-height engine built on top of them.

pub mod gcode;
pub mod pause;

pub use gcode::{
    join_layers, split_layers, CommandKind, GcodeLine, Instruction, LayerMarker, LayerProcessor,
    MachineState, ProcessorHandle, ProcessorPipeline, ProcessorRegistry, StateTracker,
};

pub use pause::{
    FeedbackSource, InjectionReport, MachineCapabilities, Melody, PauseAt, PauseAtHeight,
    PauseOptions, PauseOutcome, PauseVariant, PauseWarning, Silent, TriggerPoint,
};
