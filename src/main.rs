//! pausekit CLI - pause a 3D print at a given height or layer

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pausekit::{init_logging, process_file, registry, Config, PauseAt, PauseVariant, SpeedUnits};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pausekit")]
#[command(
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")")
)]
#[command(about = "Insert a pause into sliced G-code at a height or layer", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert the pause into a G-code file
    Process(ProcessArgs),
    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List the available processors
    Processors {
        /// Config file (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ProcessArgs {
    /// Input G-code file
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pause at this height above layer 0 (mm)
    #[arg(long, conflicts_with = "layer")]
    height: Option<f64>,

    /// Pause at this layer number
    #[arg(long, allow_negative_numbers = true)]
    layer: Option<i64>,

    /// Block layout: standard or anycubic_i3_mega
    #[arg(long)]
    variant: Option<PauseVariant>,

    /// Units of the configured retraction and extrusion speeds: mm/s or mm/min
    #[arg(long)]
    speed_units: Option<SpeedUnits>,

    /// Message shown on the printer display
    #[arg(long)]
    text: Option<String>,

    /// Print the injection report as JSON on stderr
    #[arg(long)]
    report: bool,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init {
        /// Destination (.toml or .json, default: platform config dir)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the effective config as TOML
    Show {
        /// Config file (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process(args) => run_process(args, cli.verbose),
        Commands::Config { action } => {
            init_logging(&Default::default(), cli.verbose)?;
            match action {
                ConfigAction::Init { path, force } => init_config(path, force),
                ConfigAction::Show { config } => show_config(config.as_deref()),
            }
        }
        Commands::Processors { config } => {
            let config = Config::load_or_default(config.as_deref())?;
            init_logging(&config.logging, cli.verbose)?;
            let registry = registry(&config);
            for name in registry.list_registered() {
                if let Some(processor) = registry.create(name) {
                    println!("{:<20} {}", name, processor.description());
                }
            }
            Ok(())
        }
    }
}

fn run_process(args: ProcessArgs, verbose: bool) -> Result<()> {
    let mut config = Config::load_or_default(args.config.as_deref())?;
    init_logging(&config.logging, verbose)?;

    if let Some(height) = args.height {
        config.pause.pause_at = PauseAt::Height;
        config.pause.pause_height = height;
    }
    if let Some(layer) = args.layer {
        config.pause.pause_at = PauseAt::LayerNo;
        config.pause.pause_layer = layer;
    }
    if let Some(variant) = args.variant {
        config.pause.variant = variant;
    }
    if let Some(units) = args.speed_units {
        config.pause.speed_units = units;
    }
    if let Some(text) = args.text {
        config.pause.display_text = text;
    }
    config.validate()?;
    tracing::debug!(
        trigger = %config.pause.pause_at,
        speed_units = %config.pause.speed_units,
        "Effective pause options"
    );

    let report = process_file(&args.input, args.output.as_deref(), &config)?;
    match &report {
        Some(report) => tracing::info!(layer = report.layer_index, "Pause inserted"),
        None => tracing::warn!("Pause condition never met, nothing inserted"),
    }

    if args.report {
        let json = serde_json::to_string_pretty(&report)?;
        eprintln!("{}", json);
    }

    Ok(())
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::default_path().context("No platform config directory")?,
    };
    if path.exists() && !force {
        anyhow::bail!("{} already exists, use --force to overwrite", path.display());
    }

    Config::new().save_to_file(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn show_config(path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(path)?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
