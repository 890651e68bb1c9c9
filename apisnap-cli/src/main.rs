//! apisnap CLI - snapshot a module's public API and catch accidental drift.

use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::*;
use config::ApisnapConfig;
use output::{OutputConfig, OutputFormat};

/// Public API regression guard.
///
/// apisnap records the public surface of a module (classes, functions,
/// attributes, recursively) into a baseline file and reports any drift
/// between that baseline and the current code.
#[derive(Parser)]
#[command(name = "apisnap")]
#[command(author, version)]
#[command(about = "Snapshot a module's public API and detect drift")]
#[command(propagate_version = true)]
#[command(after_help = "Examples:
  apisnap build mypkg.api             Save .apisnap/mypkg.api.json
  apisnap check mypkg.api             Fail if the API drifted
  apisnap diff old.json new.json      Compare two snapshots
  apisnap show .apisnap/mypkg.api.json")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Emit minified JSON (with --format json)
    #[arg(long, global = true)]
    compact: bool,

    /// Fail on .apisnaprc.toml errors instead of silently using defaults
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Snapshot the public API of a target into a baseline file
    Build {
        /// Target path: `module.submodule` or `module.submodule:Member`
        target: String,

        /// Baseline file to write (default: <baseline dir>/<target>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rebuild a target and validate it against its baseline
    Check {
        /// Target path: `module.submodule` or `module.submodule:Member`
        target: String,

        /// Baseline file to check against (default: <baseline dir>/<target>.json)
        #[arg(short, long)]
        baseline: Option<PathBuf>,
    },

    /// Compare two stored snapshots
    Diff {
        /// Baseline snapshot
        baseline: PathBuf,

        /// Candidate snapshot
        candidate: PathBuf,
    },

    /// Render a stored snapshot
    Show {
        /// Snapshot file
        file: PathBuf,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // Load configuration from .apisnaprc.toml
    let root = Path::new(".");
    let config = if cli.strict {
        ApisnapConfig::load_strict(root)?
    } else {
        ApisnapConfig::load(root)
    };

    // Resolve output format: CLI flag > config default > Table
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or(OutputFormat::Table)
    });

    let output_config = OutputConfig::auto_detect_with_color_override(format, config.use_color())
        .with_compact(cli.compact);
    colored::control::set_override(output_config.use_colors());

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            let _ = Cli::command().print_help();
            println!();
            return Ok(());
        }
    };

    match command {
        Commands::Build { target, output } => {
            build::run(&target, output.as_deref(), &config, &output_config)
        }
        Commands::Check { target, baseline } => {
            check::run(&target, baseline.as_deref(), &config, &output_config)
        }
        Commands::Diff {
            baseline,
            candidate,
        } => diff::run(&baseline, &candidate, &output_config),
        Commands::Show { file } => show::run(&file, &output_config),
    }
}
