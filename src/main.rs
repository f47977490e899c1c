#![forbid(unsafe_code)]

use chrono::Utc;
use error_iter::ErrorIter as _;
use fxbasis::basis::{reconcile, ReserveState};
use fxbasis::client::{JsonStatements, StatementClient, TransactionSource};
use fxbasis::errors::{ConfigError, ReconcileError, StatementClientError};
use fxbasis::model::{constants, StatementConfig, Stats};
use is_terminal::IsTerminal as _;
use onlyargs::CliError;
use onlyargs_derive::OnlyArgs;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::{env, process::ExitCode};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;

#[derive(Debug, OnlyArgs)]
#[footer = "Additional environment variables:"]
#[footer = "  - FXBASIS_API_TOKEN is the statement API bearer token"]
#[footer = "      required unless --input-statement is given"]
#[footer = "  - FXBASIS_API_URL accepts a http: or https: URL"]
#[footer = "      default is \"https://api.transferwise.com\""]
#[footer = "  - RAYON_NUM_THREADS sets the statement request concurrency"]
#[footer = "      default is 4"]
#[footer = "  - TERM_COLOR accepts \"always\" to override automatic terminal sensing"]
struct Args {
    /// Read statement JSON from a file.
    ///   The statement API is queried when no file is given.
    ///
    #[long]
    input_statement: Vec<PathBuf>,

    /// Read statement configuration RON from a file.
    #[long]
    config: Option<PathBuf>,

    /// Write the MT940 statement to this file.
    ///   Default is "mt940.txt".
    ///
    #[short('o')]
    output: Option<PathBuf>,

    /// Spends at or before this RFC 3339 time are not written.
    #[long]
    cutoff: Option<String>,

    /// Start of the statement period (RFC 3339).
    #[long]
    period_start: Option<String>,

    /// End of the statement period (RFC 3339). Default is now.
    #[long]
    period_end: Option<String>,

    /// Enable verbose output.
    /// Prints the remaining reserve lots.
    verbose: bool,
}

#[derive(Debug, Error)]
enum Error {
    #[error("Argument parsing error")]
    Args(#[from] CliError),

    #[error("Configuration error")]
    Config(#[from] ConfigError),

    #[error("Date parsing error")]
    Date(#[from] chrono::ParseError),

    #[error("Statement API client error")]
    Client(#[from] StatementClientError),

    #[error("Reconciliation failed")]
    Reconcile(#[from] ReconcileError),

    #[error("Output path has no file name: {0:?}")]
    OutputPath(PathBuf),

    #[error("Unable to write statement: `{0:?}`")]
    Output(PathBuf, #[source] std::io::Error),

    #[error("Unable to rename statement: `{0:?}`")]
    OutputRename(PathBuf, #[source] std::io::Error),
}

fn main() -> ExitCode {
    // Initialize the tracing subscriber for instrumentation.
    // Uses the `RUST_LOG` environment var for configuration. E.g. `RUST_LOG=debug cargo run`
    //
    // See: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/struct.EnvFilter.html#directives
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let term_color = env::var("TERM_COLOR")
        .map(|color| color == "always")
        .unwrap_or_else(|_| std::io::stdout().is_terminal());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_ansi(term_color))
        .with(env_filter)
        .init();

    match run(onlyargs::parse()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            for source in err.sources().skip(1) {
                eprintln!("  Caused by: {source}");
            }

            ExitCode::FAILURE
        }
    }
}

fn run(args: Result<Args, CliError>) -> Result<(), Error> {
    let args = args?;

    let mut config = match &args.config {
        Some(path) => {
            debug!("Loading config from {path:?}");
            StatementConfig::load(path)?
        }
        None => StatementConfig::default(),
    };

    // Command line overrides.
    if let Some(cutoff) = &args.cutoff {
        config.cutoff = cutoff.parse()?;
    }
    if let Some(start) = &args.period_start {
        config.period_start = start.parse()?;
    }
    if let Some(end) = &args.period_end {
        config.period_end = Some(end.parse()?);
    }
    config.validate()?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_OUTPUT_PATH));
    let temp = temp_path(&output)?;

    let source: Box<dyn TransactionSource> = if args.input_statement.is_empty() {
        Box::new(StatementClient::from_env(&config, Utc::now())?)
    } else {
        Box::new(JsonStatements::new(args.input_statement))
    };

    let mut stats = Stats::default();
    let state = write_statement(source.as_ref(), &config, &temp, &mut stats).inspect_err(|_| {
        debug!("Removing temporary statement {temp:?}");
        let _ = fs::remove_file(&temp);
    })?;

    debug!("Renaming temporary statement to {output:?}");
    fs::rename(&temp, &output).map_err(|err| Error::OutputRename(output.clone(), err))?;

    stats.pretty_print();

    let path = output.display();
    let underline = "=".repeat(path.to_string().len());
    println!("Statement written to {path}");
    println!("========= ======= == {underline}");
    println!();

    if args.verbose {
        print_reserves(&state, &config);
    }

    Ok(())
}

/// The temporary statement lives beside the output so the final rename stays on one filesystem.
fn temp_path(output: &Path) -> Result<PathBuf, Error> {
    let name = output
        .file_name()
        .ok_or_else(|| Error::OutputPath(output.to_path_buf()))?;

    Ok(output.with_file_name(format!(".{}.tmp", name.to_string_lossy())))
}

fn write_statement(
    source: &dyn TransactionSource,
    config: &StatementConfig,
    temp: &Path,
    stats: &mut Stats,
) -> Result<ReserveState, Error> {
    // Created before any transaction is read, so an unwritable destination fails first.
    debug!("Writing temporary statement to {temp:?}");
    let file = File::create(temp).map_err(|err| Error::Output(temp.to_path_buf(), err))?;
    let mut writer = BufWriter::new(file);

    let state = reconcile(source, config, &mut writer, stats)?;
    writer
        .flush()
        .map_err(|err| Error::Output(temp.to_path_buf(), err))?;

    Ok(state)
}

fn print_reserves(state: &ReserveState, config: &StatementConfig) {
    println!("Reserve Lots");
    println!("======= ====");
    println!();

    for (index, lot) in state.reserves.active_lots() {
        println!(
            "#{index:<4} {} {:>14} @ {:<12} acquired {}",
            config.foreign_currency,
            lot.remaining,
            lot.rate,
            lot.acquired.format("%Y-%m-%d %H:%M:%S"),
        );
    }
    println!();
    println!(
        "Total   {} {:>14}",
        config.foreign_currency,
        state.reserves.total()
    );
}
