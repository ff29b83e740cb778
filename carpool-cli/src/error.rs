//! Error types emitted by the carpool CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use carpool_core::{PersistenceError, SqlitePerformanceStoreError};
use carpool_data::traffic::ProviderBuildError;
use thiserror::Error;

/// Errors emitted by the carpool CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist on disk or is not a file.
    #[error("{field} path {path:?} does not exist or is not a file")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening an input document failed.
    #[error("failed to open {field} at {path:?}: {source}")]
    OpenInput {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An input document is not valid JSON for its type.
    #[error("failed to parse {field} JSON at {path:?}: {source}")]
    ParseInput {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The candidates document held no routes.
    #[error("no candidate routes in {path:?}")]
    NoCandidates { path: Utf8PathBuf },
    /// A retention window of zero or fewer days was requested.
    #[error("retention must be at least one day, got {days}")]
    InvalidRetention { days: i64 },
    /// The directory for the database could not be created.
    #[error("failed to prepare database directory for {path:?}: {source}")]
    PrepareDatabase {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the performance database failed.
    #[error(transparent)]
    OpenStore(#[from] SqlitePerformanceStoreError),
    /// Reading or writing the performance database failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    /// Constructing the traffic provider failed.
    #[error("failed to build traffic provider for {base_url:?}: {source}")]
    BuildTrafficProvider {
        base_url: String,
        #[source]
        source: ProviderBuildError,
    },
    /// Constructing the advisor client failed.
    #[error("failed to build advisor client for {endpoint:?}: {source}")]
    BuildAdvisor {
        endpoint: String,
        #[source]
        source: ProviderBuildError,
    },
    /// The async runtime could not start.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// Serializing command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
