//! # pausekit
//!
//! A G-code post-processor that pauses a 3D print at a chosen height or
//! layer so the operator can swap filament or insert parts.
//!
//! ## Architecture
//!
//! pausekit is organized as a workspace with multiple crates:
//!
//! 1. **pausekit-core** - Error types and unit helpers
//! 2. **pausekit-gcode** - Instruction model, state tracking, layer pipeline
//!    and the pause-at-height engine
//! 3. **pausekit-settings** - Configuration files and validation
//! 4. **pausekit** - Command-line binary that integrates all crates
//!
//! ## Processing
//!
//! A G-code file is split into layers at `;LAYER:` markers, run through a
//! [`ProcessorPipeline`] and joined back. The pause engine rewrites at most
//! one layer; everything else passes through byte for byte.

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;

pub use pausekit_core::{Error, ProcessorError, Result, SpeedUnits};
pub use pausekit_gcode::pause::{
    InjectionReport, MachineCapabilities, PauseAt, PauseAtHeight, PauseOptions, PauseOutcome,
    PauseVariant, PauseWarning, PROCESSOR_NAME,
};
pub use pausekit_gcode::{
    join_layers, split_layers, LayerProcessor, ProcessorHandle, ProcessorPipeline,
    ProcessorRegistry,
};
pub use pausekit_settings::{Config, LoggingSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging on stderr with:
/// - `RUST_LOG` environment variable support, falling back to the
///   configured level (or `debug` when `verbose` is set)
/// - Human-readable or JSON lines output
pub fn init_logging(settings: &LoggingSettings, verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { settings.level.as_str() };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("Invalid log filter")?;

    // stdout may carry the processed G-code
    let subscriber = tracing_subscriber::registry().with(env_filter);
    if settings.json {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .try_init()?;
    }

    Ok(())
}

/// Registry holding the processors buildable from a config
pub fn registry(config: &Config) -> ProcessorRegistry {
    let options = config.pause.clone();
    let machine = config.machine.clone();

    let mut registry = ProcessorRegistry::new();
    registry.register(PROCESSOR_NAME, move || {
        Arc::new(PauseAtHeight::new(options.clone(), machine.clone())) as ProcessorHandle
    });
    registry
}

/// Apply the configured pause to a whole G-code document
pub fn process_gcode(text: &str, config: &Config) -> PauseOutcome {
    let engine = PauseAtHeight::new(config.pause.clone(), config.machine.clone());
    let outcome = engine.execute(split_layers(text));
    tracing::debug!(injected = outcome.injected(), "Processed document");
    outcome
}

/// Read `input`, apply the configured pause and write the result.
///
/// Writes to stdout when `output` is `None`.
pub fn process_file(
    input: &Path,
    output: Option<&Path>,
    config: &Config,
) -> anyhow::Result<Option<InjectionReport>> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let outcome = process_gcode(&text, config);
    let rendered = join_layers(&outcome.layers);

    match output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }

    Ok(outcome.report)
}
