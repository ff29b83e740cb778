//! Command-line interface for the carpool route scoring engine.
//!
//! Every command works against one SQLite performance database, chosen with
//! `--database` or `CARPOOL_DATABASE`. The live weights used for scoring are
//! restored from that database's adjustment audit on each invocation.
#![forbid(unsafe_code)]

use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use carpool_core::SqlitePerformanceStore;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde::de::DeserializeOwned;

mod adjust;
mod error;
mod score;
mod store;

pub use error::CliError;

use adjust::AdjustArgs;
use score::ScoreArgs;
use store::{CleanupArgs, HistoryArgs, RecordArgs};

const ARG_DATABASE: &str = "database";
const ENV_DATABASE: &str = "CARPOOL_DATABASE";
const DEFAULT_DATABASE: &str = "route_optimizer.db";
const ARG_CANDIDATES: &str = "candidates";
const ENV_CANDIDATES: &str = "CARPOOL_CMDS_SCORE_CANDIDATES";
const ARG_TRAFFIC_URL: &str = "traffic-url";
const ARG_TRAFFIC_KEY: &str = "traffic-key";
const ENV_TRAFFIC_KEY: &str = "CARPOOL_CMDS_SCORE_TRAFFIC_KEY";
const ARG_PERFORMANCE: &str = "performance";
const ARG_RETENTION_DAYS: &str = "retention-days";
const ARG_LIMIT: &str = "limit";
const ARG_ADVISOR_URL: &str = "advisor-url";
const ENV_ADVISOR_URL: &str = "CARPOOL_CMDS_ADJUST_ADVISOR_URL";
const ARG_ADVISOR_MODEL: &str = "advisor-model";
const ARG_ADVISOR_TIMEOUT: &str = "advisor-timeout-secs";
const ARG_MIN_ROUTES: &str = "min-routes";
const ARG_INTERVAL_HOURS: &str = "interval-hours";
const ARG_MAX_WEIGHT_CHANGE: &str = "max-weight-change";
const ARG_BLEND_FACTOR: &str = "blend-factor";

/// Run the carpool CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    run_with(cli, &mut stdout)
}

fn run_with(cli: Cli, writer: &mut dyn Write) -> Result<(), CliError> {
    let database = cli.database;
    match cli.command {
        Command::Score(args) => score::run_score(args, &database, writer),
        Command::Record(args) => store::run_record(&args, &database, writer),
        Command::Stats => store::run_stats(&database, writer),
        Command::Cleanup(args) => store::run_cleanup(&args, &database, writer),
        Command::History(args) => store::run_history(&args, &database, writer),
        Command::Adjust(args) => adjust::run_adjust(args, &database, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "carpool",
    about = "Score carpool routes and learn scoring weights from trip outcomes",
    version
)]
struct Cli {
    /// SQLite database holding trip outcomes and the adjustment audit.
    #[arg(
        long = ARG_DATABASE,
        env = ENV_DATABASE,
        default_value = DEFAULT_DATABASE,
        value_name = "path",
        global = true
    )]
    database: Utf8PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank candidate routes with the live weights.
    Score(ScoreArgs),
    /// Record the outcome of a completed or abandoned trip.
    Record(RecordArgs),
    /// Print aggregate deviation statistics.
    Stats,
    /// Delete trip records written outside the retention window.
    Cleanup(CleanupArgs),
    /// Print the weight adjustment audit trail, newest first.
    History(HistoryArgs),
    /// Run one gated weight adjustment cycle.
    Adjust(AdjustArgs),
}

fn open_store(database: &Utf8Path) -> Result<SqlitePerformanceStore, CliError> {
    carpool_fs::ensure_parent_dir(database).map_err(|source| CliError::PrepareDatabase {
        path: database.to_path_buf(),
        source,
    })?;
    Ok(SqlitePerformanceStore::open(database.as_std_path())?)
}

fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match carpool_fs::is_regular_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Load a JSON document of type `T` from `path`.
fn load_json<T: DeserializeOwned>(path: &Utf8Path, field: &'static str) -> Result<T, CliError> {
    require_existing(path, field)?;
    let file = carpool_fs::open_utf8_file(path).map_err(|source| CliError::OpenInput {
        field,
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseInput {
        field,
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize + ?Sized>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
}

#[cfg(test)]
mod tests;
