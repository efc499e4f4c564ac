//! axsync CLI: drive the AXI4-Lite bus model from a script.
//!
//! Provides `axsync run` for executing a bus script against the reference
//! slave (optionally recording a trace) and `axsync check-config` for
//! validating an `axsync.toml` file.

#![warn(missing_docs)]

mod run;
mod script;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::LevelFilter;

/// axsync: cycle-accurate AXI4-Lite transactor.
#[derive(Parser, Debug)]
#[command(name = "axsync", version, about = "AXI4-Lite bus model driver")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `axsync.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a bus script against the reference slave.
    Run(RunArgs),
    /// Validate a configuration file.
    CheckConfig {
        /// Configuration file, or a directory containing `axsync.toml`.
        file: PathBuf,
    },
}

/// Arguments for the `axsync run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Script file, one command per line.
    pub script: PathBuf,

    /// Record a trace to this path (`.vcd`, `.jsonl`, optionally `.gz`).
    #[arg(short, long)]
    pub trace: Option<PathBuf>,

    /// Trace hierarchy depth (overrides `[trace] depth`).
    #[arg(short, long)]
    pub depth: Option<u32>,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Optional path to a custom config file.
    pub config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Run(ref args) => run::run(args, &global),
        Command::CheckConfig { ref file } => run::check_config(file, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// `RUST_LOG` wins over the level implied by the flags.
fn init_logging(quiet: bool, verbose: bool) {
    let level = log_level(quiet, verbose);
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .format_timestamp(None)
        .init();
}

fn log_level(quiet: bool, verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Warn
    }
}
