//! Commands that read and maintain the performance database.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use carpool_core::{DEFAULT_RETENTION_DAYS, PerformanceStore, RoutePerformance};
use chrono::TimeDelta;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_LIMIT, ARG_PERFORMANCE, ARG_RETENTION_DAYS, CliError, load_json, open_store, write_json,
};

const ENV_PERFORMANCE: &str = "CARPOOL_CMDS_RECORD_PERFORMANCE";
const DEFAULT_HISTORY_LIMIT: usize = 10;

/// CLI arguments for the `record` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Record the planned and actual metrics of one trip. The \
                 record is read from a JSON file; leave its id empty to have \
                 one generated. Recording an id that already exists changes \
                 nothing.",
    about = "Record a trip outcome"
)]
#[ortho_config(prefix = "CARPOOL")]
pub(crate) struct RecordArgs {
    /// Path to a JSON file containing one trip outcome.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) performance: Option<Utf8PathBuf>,
}

/// CLI arguments for the `cleanup` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Delete trip records older than the retention window")]
#[ortho_config(prefix = "CARPOOL")]
pub(crate) struct CleanupArgs {
    /// Days a record is kept after it was written (default 90).
    #[arg(long = ARG_RETENTION_DAYS, value_name = "days")]
    #[serde(default)]
    pub(crate) retention_days: Option<i64>,
}

/// CLI arguments for the `history` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Show recent weight adjustments")]
#[ortho_config(prefix = "CARPOOL")]
pub(crate) struct HistoryArgs {
    /// Maximum number of adjustments to print (default 10).
    #[arg(long = ARG_LIMIT, value_name = "count")]
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecordReport {
    pub(crate) id: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CleanupReport {
    pub(crate) deleted: usize,
    pub(crate) retention_days: i64,
}

pub(crate) fn run_record(
    args: &RecordArgs,
    database: &Utf8Path,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let path = merged.performance.ok_or(CliError::MissingArgument {
        field: ARG_PERFORMANCE,
        env: ENV_PERFORMANCE,
    })?;
    let record: RoutePerformance = load_json(&path, ARG_PERFORMANCE)?;
    let store = open_store(database)?;
    let id = store.record_performance(&record)?;
    write_json(writer, &RecordReport { id })
}

pub(crate) fn run_stats(database: &Utf8Path, writer: &mut dyn Write) -> Result<(), CliError> {
    let store = open_store(database)?;
    let stats = store.performance_stats()?;
    write_json(writer, &stats)
}

pub(crate) fn run_cleanup(
    args: &CleanupArgs,
    database: &Utf8Path,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let retention_days = merged.retention_days.unwrap_or(DEFAULT_RETENTION_DAYS);
    let retention = retention_window(retention_days)?;
    let store = open_store(database)?.with_retention(retention);
    let deleted = store.cleanup_old_data()?;
    write_json(
        writer,
        &CleanupReport {
            deleted,
            retention_days,
        },
    )
}

pub(crate) fn run_history(
    args: &HistoryArgs,
    database: &Utf8Path,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let limit = merged.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let store = open_store(database)?;
    let history = store.adjustment_history(limit)?;
    write_json(writer, &history)
}

pub(crate) fn retention_window(days: i64) -> Result<TimeDelta, CliError> {
    if days < 1 {
        return Err(CliError::InvalidRetention { days });
    }
    TimeDelta::try_days(days).ok_or(CliError::InvalidRetention { days })
}
