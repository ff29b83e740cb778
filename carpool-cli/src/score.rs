//! Score command implementation for the carpool CLI.

use std::io::Write;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use carpool_core::{CandidateRoute, LiveWeights, MetricWeights, ScoredRoute, TrafficProvider};
use carpool_data::traffic::{HttpTrafficProvider, TrafficCache, TrafficCacheConfig};
use carpool_scorer::{RoutePlan, RoutePlanner, ScoringEngine};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_CANDIDATES, ARG_TRAFFIC_KEY, ARG_TRAFFIC_URL, CliError, ENV_CANDIDATES, ENV_TRAFFIC_KEY,
    load_json, open_store, runtime, write_json,
};

/// CLI arguments for the `score` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Rank a JSON array of candidate routes with the weights \
                 currently in force. When a traffic service is configured, \
                 reliability is adjusted for congestion in the given area \
                 and the output reports where the traffic came from.",
    about = "Rank candidate routes"
)]
#[ortho_config(prefix = "CARPOOL")]
pub(crate) struct ScoreArgs {
    /// Path to a JSON file containing candidate routes.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) candidates: Option<Utf8PathBuf>,
    /// Base URL of the traffic service (e.g. "http://localhost:8080").
    #[arg(long = ARG_TRAFFIC_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) traffic_url: Option<String>,
    /// Area key the traffic snapshot is requested for.
    #[arg(long = ARG_TRAFFIC_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) traffic_key: Option<String>,
}

impl ScoreArgs {
    fn into_config(self) -> Result<ScoreConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ScoreConfig::try_from(merged)
    }
}

/// Traffic service consulted while scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrafficSource {
    pub(crate) base_url: String,
    pub(crate) area: String,
}

/// Resolved `score` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScoreConfig {
    /// Path to the candidates document.
    pub(crate) candidates: Utf8PathBuf,
    /// Traffic service, when live adjustments were requested.
    pub(crate) traffic: Option<TrafficSource>,
}

impl TryFrom<ScoreArgs> for ScoreConfig {
    type Error = CliError;

    fn try_from(args: ScoreArgs) -> Result<Self, Self::Error> {
        let candidates = args.candidates.ok_or(CliError::MissingArgument {
            field: ARG_CANDIDATES,
            env: ENV_CANDIDATES,
        })?;
        let traffic = match args.traffic_url {
            Some(base_url) => {
                let area = args.traffic_key.ok_or(CliError::MissingArgument {
                    field: ARG_TRAFFIC_KEY,
                    env: ENV_TRAFFIC_KEY,
                })?;
                Some(TrafficSource { base_url, area })
            }
            None => None,
        };
        Ok(Self {
            candidates,
            traffic,
        })
    }
}

/// Builds the traffic provider for the current score invocation.
pub(crate) trait TrafficProviderBuilder {
    fn build(&self, base_url: &str) -> Result<Arc<dyn TrafficProvider>, CliError>;
}

pub(crate) struct HttpTrafficProviderBuilder;

impl TrafficProviderBuilder for HttpTrafficProviderBuilder {
    fn build(&self, base_url: &str) -> Result<Arc<dyn TrafficProvider>, CliError> {
        let provider =
            HttpTrafficProvider::new(base_url).map_err(|source| CliError::BuildTrafficProvider {
                base_url: base_url.to_owned(),
                source,
            })?;
        Ok(Arc::new(provider))
    }
}

/// Output of `score`: a bare ranking, or a plan that reports traffic status.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum ScoreOutput {
    Ranked(Vec<ScoredRoute>),
    Planned(RoutePlan),
}

pub(crate) fn run_score(
    args: ScoreArgs,
    database: &Utf8Path,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    run_score_with(args, database, &HttpTrafficProviderBuilder, writer)
}

pub(crate) fn run_score_with(
    args: ScoreArgs,
    database: &Utf8Path,
    builder: &dyn TrafficProviderBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let output = execute_score(&config, database, builder)?;
    write_json(writer, &output)
}

pub(crate) fn execute_score(
    config: &ScoreConfig,
    database: &Utf8Path,
    builder: &dyn TrafficProviderBuilder,
) -> Result<ScoreOutput, CliError> {
    let candidates: Vec<CandidateRoute> = load_json(&config.candidates, ARG_CANDIDATES)?;
    if candidates.is_empty() {
        return Err(CliError::NoCandidates {
            path: config.candidates.clone(),
        });
    }

    let store = open_store(database)?;
    let engine = ScoringEngine::new(LiveWeights::restore(&store, MetricWeights::default()));

    let Some(source) = &config.traffic else {
        return Ok(ScoreOutput::Ranked(engine.rank(&candidates)));
    };
    let provider = builder.build(&source.base_url)?;
    let planner = RoutePlanner::new(
        engine,
        TrafficCache::new(provider, TrafficCacheConfig::default()),
    );
    let plan = runtime()?.block_on(planner.plan(&source.area, &candidates));
    Ok(ScoreOutput::Planned(plan))
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ScoreConfig, CliError> {
    let merged = ScoreArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ScoreConfig::try_from(merged)
}
