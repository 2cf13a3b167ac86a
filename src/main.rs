//! Workforce scheduling engine CLI.
//!
//! Run with: workforce-engine <input_path> <output_path> [--time-limit SECS]
//!                                                        [--threads N]
//!                                                        [--log-level LEVEL]
//!
//! Reads the §6 JSON input contract from `input_path`, runs the pipeline, and
//! writes the matching success/failure envelope to `output_path`. Exits 0 on
//! every clean termination — including infeasibility, which is a reported
//! outcome, not a process failure — and non-zero only when the input/output
//! files themselves cannot be read or written.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use workforce_engine::dto::EngineInput;
use workforce_engine::error::EngineError;
use workforce_engine::pipeline;

/// Cost-optimized worker/shift scheduling engine.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to the input JSON file (§6 schema).
    input_path: PathBuf,
    /// Path the output envelope is written to.
    output_path: PathBuf,
    /// Overrides `constraints.time_limit` from the input file, in seconds.
    #[arg(long)]
    time_limit: Option<u64>,
    /// Overrides `constraints.threads` from the input file.
    #[arg(long)]
    threads: Option<u32>,
    /// Overrides the default `RUST_LOG` filter (default: info).
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match &cli.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let raw = match fs::read_to_string(&cli.input_path) {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!("failed to read {}: {err}", cli.input_path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut input: EngineInput = match serde_json::from_str(&raw) {
        Ok(input) => input,
        Err(err) => {
            // Malformed-but-present input is a reported ValidationError
            // (§7 policy), not a process crash: still write a schema-valid
            // envelope so the external job runner gets a structured reason.
            eprintln!("failed to parse {}: {err}", cli.input_path.display());
            let envelope = pipeline::error_envelope(&EngineError::from(err), Vec::new());
            return write_envelope(&cli.output_path, &envelope.to_json());
        }
    };

    if let Some(time_limit) = cli.time_limit {
        input.constraints.time_limit = time_limit;
    }
    if let Some(threads) = cli.threads {
        input.constraints.threads = Some(threads);
    }

    let outcome = pipeline::run_pipeline(input);
    write_envelope(&cli.output_path, &outcome.to_json())
}

fn write_envelope(output_path: &std::path::Path, json: &serde_json::Value) -> ExitCode {
    let rendered = match serde_json::to_string_pretty(json) {
        Ok(rendered) => rendered,
        Err(err) => {
            eprintln!("failed to serialize output envelope: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = fs::write(output_path, rendered) {
        eprintln!("failed to write {}: {err}", output_path.display());
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
