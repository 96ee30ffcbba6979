//! rackctl - extract rack workflows from live set snapshots
//!
//! Subcommands:
//! - `rackctl extract --snapshot <file> <track> <device>` - Extract one device tree
//! - `rackctl diagnose --snapshot <file>` - List tracks and devices
//! - `rackctl summary <export.json>` - Summarize an exported workflow
//! - `rackctl config` - Show the effective configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rackconf::RackConfig;
use rackwalk::{Annotations, Difficulty};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "rackctl")]
#[command(about = "Extract rack, chain and device hierarchies with their parameters")]
#[command(version)]
struct Cli {
    /// Config file used instead of ./rackwalk.toml
    #[arg(long, global = true, env = "RACKWALK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the device at <TRACK>/<DEVICE> and export it as JSON
    Extract {
        /// Live set snapshot (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Zero-based track index
        track: usize,

        /// Zero-based device index on the track
        device: usize,

        /// Output file (default: <export dir>/rack_export_<millis>.json)
        #[arg(short, long, conflicts_with = "print")]
        out: Option<PathBuf>,

        /// Write JSON to stdout instead of a file
        #[arg(long)]
        print: bool,

        /// Compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,

        /// Override the configured maximum nesting depth
        #[arg(long)]
        max_depth: Option<usize>,

        #[command(flatten)]
        annotations: AnnotationArgs,
    },

    /// List the first tracks of a snapshot and the devices on them
    Diagnose {
        /// Live set snapshot (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Print the overview as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize a previously exported workflow
    Summary {
        /// Exported workflow JSON
        export: PathBuf,
    },

    /// Show the effective configuration and where it came from
    Config,
}

/// User metadata stamped onto the extraction.
#[derive(Args, Default)]
struct AnnotationArgs {
    /// What the rack is for
    #[arg(long)]
    use_case: Option<String>,

    /// Tag, may be repeated
    #[arg(long = "tag")]
    tags: Vec<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    category: Option<String>,

    /// beginner, intermediate or advanced
    #[arg(long)]
    difficulty: Option<Difficulty>,

    #[arg(long)]
    genre: Option<String>,

    #[arg(long)]
    notes: Option<String>,
}

impl AnnotationArgs {
    fn into_annotations(self) -> Annotations {
        let mut annotations = Annotations {
            use_case: self.use_case.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            difficulty: self.difficulty,
            genre: self.genre.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
            ..Default::default()
        };
        annotations.add_tags(&self.tags);
        annotations
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = RackConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&config.telemetry.log_level);

    match cli.command {
        Commands::Extract {
            snapshot,
            track,
            device,
            out,
            print,
            compact,
            max_depth,
            annotations,
        } => {
            let mut config = config;
            if let Some(depth) = max_depth {
                config.extraction.max_depth = depth;
            }
            if compact {
                config.export.pretty = false;
            }
            let target = match (print, out) {
                (true, _) => commands::ExportTarget::Stdout,
                (false, Some(path)) => commands::ExportTarget::File(path),
                (false, None) => commands::ExportTarget::Dir(config.export.dir.clone()),
            };
            commands::extract(
                &config,
                &snapshot,
                track,
                device,
                annotations.into_annotations(),
                target,
            )?;
        }
        Commands::Diagnose { snapshot, json } => {
            commands::diagnose(&snapshot, json)?;
        }
        Commands::Summary { export } => {
            commands::summary(&export)?;
        }
        Commands::Config => {
            commands::show_config(&config, &sources);
        }
    }

    Ok(())
}
