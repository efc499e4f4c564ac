//! `axsync run` and `axsync check-config`.
//!
//! Loads the configuration, builds a transactor around a fresh session,
//! optionally attaches a trace, and executes a bus script.

use std::io::Write;
use std::path::{Path, PathBuf};

use axsync_config::{SyncConfig, TraceFormatSetting, CONFIG_FILE_NAME};
use axsync_sim::{ModelConfig, SyncSession, TraceFormat, Transactor, TransactorConfig};
use log::{debug, info};

use crate::script::{execute, parse_script};
use crate::{GlobalArgs, RunArgs};

/// Runs the `axsync run` command.
///
/// Returns exit code 0 when every `expect` matched, 1 otherwise.
pub fn run(args: &RunArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = resolve_config(global)?;

    let text = std::fs::read_to_string(&args.script)
        .map_err(|e| format!("cannot read script {}: {e}", args.script.display()))?;
    let script = parse_script(&text)?;
    debug!("parsed {} commands from {}", script.len(), args.script.display());

    let mut session = SyncSession::with_config(model_config(&config));
    session.set_trace_format(config.trace.format.map(trace_format));
    if let Some(path) = &args.trace {
        let depth = args.depth.unwrap_or(config.trace.depth);
        session.start_tracing(path, depth)?;
        info!("tracing to {} at depth {depth}", path.display());
    }

    if !global.quiet {
        eprintln!("     Running {}", args.script.display());
    }

    let mut transactor = Transactor::new(session, transactor_config(&config));
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = execute(
        &script,
        &mut transactor,
        config.transactor.reset_cycles,
        &mut out,
    );
    out.flush()?;
    let cycles = transactor.total_cycles();
    // Finalize the trace even when the script stopped early.
    let closed = transactor.close();
    let outcome = result?;
    closed?;

    for mismatch in &outcome.mismatches {
        eprintln!("mismatch: {mismatch}");
    }
    if !global.quiet {
        eprintln!(
            "    Finished {} commands in {cycles} cycles, {} mismatches",
            outcome.commands,
            outcome.mismatches.len()
        );
    }
    Ok(if outcome.passed() { 0 } else { 1 })
}

/// Runs the `axsync check-config` command.
pub fn check_config(file: &Path, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = axsync_config::load_config(file)?;
    if !global.quiet {
        eprintln!(
            "    Valid: {} registers at {:#010x}, timeout {} cycles",
            config.slave.register_count,
            config.slave.base_address,
            config.transactor.timeout_cycles
        );
    }
    Ok(0)
}

/// Loads `--config` if given, else `./axsync.toml` if present, else defaults.
fn resolve_config(global: &GlobalArgs) -> Result<SyncConfig, Box<dyn std::error::Error>> {
    let path = match &global.config {
        Some(path) => path.clone(),
        None => {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if !local.is_file() {
                debug!("no {CONFIG_FILE_NAME} found, using defaults");
                return Ok(SyncConfig::default());
            }
            local
        }
    };
    debug!("loading config from {}", path.display());
    axsync_config::load_config(&path)
        .map_err(|e| format!("{}: {e}", path.display()).into())
}

fn model_config(config: &SyncConfig) -> ModelConfig {
    ModelConfig {
        base_address: config.slave.base_address,
        register_count: config.slave.register_count,
    }
}

fn transactor_config(config: &SyncConfig) -> TransactorConfig {
    TransactorConfig {
        timeout_cycles: config.transactor.timeout_cycles,
        prot: config.transactor.prot,
    }
}

fn trace_format(setting: TraceFormatSetting) -> TraceFormat {
    match setting {
        TraceFormatSetting::Vcd => TraceFormat::Vcd,
        TraceFormatSetting::Jsonl => TraceFormat::JsonLines,
    }
}
