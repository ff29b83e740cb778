//! Adjust command implementation for the carpool CLI.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8Path;
use carpool_core::{
    LiveWeights, MetricWeights, PerformanceStore, SystemClock, WeightAdjustmentResult,
    WeightAdvisor,
};
use carpool_data::advisor::{HttpAdvisorConfig, HttpWeightAdvisor};
use carpool_tuner::{AdjustmentConfig, CycleOutcome, WeightAdjuster};
use chrono::TimeDelta;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_ADVISOR_MODEL, ARG_ADVISOR_TIMEOUT, ARG_ADVISOR_URL, ARG_BLEND_FACTOR,
    ARG_INTERVAL_HOURS, ARG_MAX_WEIGHT_CHANGE, ARG_MIN_ROUTES, CliError, ENV_ADVISOR_URL,
    open_store, runtime, write_json,
};

/// CLI arguments for the `adjust` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Run one weight adjustment cycle against the performance \
                 database. The cycle is skipped when the last adjustment is \
                 too recent or too few trips were completed since; otherwise \
                 the advisor is asked for new weights, which are clamped and \
                 blended before they are recorded.",
    about = "Learn new scoring weights from recorded trips"
)]
#[ortho_config(prefix = "CARPOOL")]
pub(crate) struct AdjustArgs {
    /// Endpoint of the analytical advisor.
    #[arg(long = ARG_ADVISOR_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) advisor_url: Option<String>,
    /// Model identifier forwarded to the advisor.
    #[arg(long = ARG_ADVISOR_MODEL, value_name = "id")]
    #[serde(default)]
    pub(crate) advisor_model: Option<String>,
    /// Bearer token for the advisor. Prefer the environment or a config file.
    #[arg(skip)]
    #[serde(default)]
    pub(crate) advisor_api_key: Option<String>,
    /// Seconds to wait for the advisor before skipping the cycle.
    #[arg(long = ARG_ADVISOR_TIMEOUT, value_name = "secs")]
    #[serde(default)]
    pub(crate) advisor_timeout_secs: Option<u64>,
    /// Completed trips required since the last adjustment.
    #[arg(long = ARG_MIN_ROUTES, value_name = "count")]
    #[serde(default)]
    pub(crate) min_routes: Option<u64>,
    /// Minimum hours between two adjustments.
    #[arg(long = ARG_INTERVAL_HOURS, value_name = "hours")]
    #[serde(default)]
    pub(crate) interval_hours: Option<u32>,
    /// Largest change any weight may make in one cycle.
    #[arg(long = ARG_MAX_WEIGHT_CHANGE, value_name = "fraction")]
    #[serde(default)]
    pub(crate) max_weight_change: Option<f64>,
    /// Share of the clamped proposal blended into the current weights.
    #[arg(long = ARG_BLEND_FACTOR, value_name = "fraction")]
    #[serde(default)]
    pub(crate) blend_factor: Option<f64>,
}

impl AdjustArgs {
    fn into_config(self) -> Result<AdjustConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        AdjustConfig::try_from(merged)
    }
}

/// Resolved `adjust` command configuration.
#[derive(Debug, Clone)]
pub(crate) struct AdjustConfig {
    pub(crate) advisor: HttpAdvisorConfig,
    pub(crate) adjustment: AdjustmentConfig,
}

impl TryFrom<AdjustArgs> for AdjustConfig {
    type Error = CliError;

    fn try_from(args: AdjustArgs) -> Result<Self, Self::Error> {
        let endpoint = args.advisor_url.ok_or(CliError::MissingArgument {
            field: ARG_ADVISOR_URL,
            env: ENV_ADVISOR_URL,
        })?;

        let mut adjustment = AdjustmentConfig::default();
        let mut advisor = HttpAdvisorConfig::new(endpoint);
        if let Some(model_id) = args.advisor_model {
            advisor = advisor.with_model_id(model_id);
        }
        if let Some(api_key) = args.advisor_api_key {
            advisor = advisor.with_api_key(api_key);
        }
        if let Some(secs) = args.advisor_timeout_secs {
            let timeout = Duration::from_secs(secs);
            advisor = advisor.with_timeout(timeout);
            adjustment = adjustment.with_advisor_timeout(timeout);
        }
        if let Some(min_routes) = args.min_routes {
            adjustment = adjustment.with_min_routes_threshold(min_routes);
        }
        if let Some(hours) = args.interval_hours {
            adjustment = adjustment.with_adjustment_interval(TimeDelta::hours(i64::from(hours)));
        }
        if let Some(max_change) = args.max_weight_change {
            adjustment = adjustment.with_max_weight_change(max_change);
        }
        if let Some(blend) = args.blend_factor {
            adjustment = adjustment.with_incremental_blend_factor(blend);
        }
        Ok(Self {
            advisor,
            adjustment,
        })
    }
}

/// Builds the advisor client for the current adjust invocation.
pub(crate) trait AdvisorBuilder {
    fn build(&self, config: &HttpAdvisorConfig) -> Result<Arc<dyn WeightAdvisor>, CliError>;
}

pub(crate) struct HttpAdvisorBuilder;

impl AdvisorBuilder for HttpAdvisorBuilder {
    fn build(&self, config: &HttpAdvisorConfig) -> Result<Arc<dyn WeightAdvisor>, CliError> {
        let advisor = HttpWeightAdvisor::with_config(config.clone()).map_err(|source| {
            CliError::BuildAdvisor {
                endpoint: config.endpoint.clone(),
                source,
            }
        })?;
        Ok(Arc::new(advisor))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum AdjustStatus {
    Applied,
    Skipped,
}

/// Printed outcome of one cycle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AdjustReport {
    pub(crate) status: AdjustStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) adjustment: Option<WeightAdjustmentResult>,
    pub(crate) live_weights: MetricWeights,
}

impl AdjustReport {
    fn new(outcome: CycleOutcome, live_weights: MetricWeights) -> Self {
        match outcome {
            CycleOutcome::Applied(result) => Self {
                status: AdjustStatus::Applied,
                reason: None,
                adjustment: Some(result),
                live_weights,
            },
            CycleOutcome::Skipped(reason) => Self {
                status: AdjustStatus::Skipped,
                reason: Some(reason.to_string()),
                adjustment: None,
                live_weights,
            },
        }
    }
}

pub(crate) fn run_adjust(
    args: AdjustArgs,
    database: &Utf8Path,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    run_adjust_with(args, database, &HttpAdvisorBuilder, writer)
}

pub(crate) fn run_adjust_with(
    args: AdjustArgs,
    database: &Utf8Path,
    builder: &dyn AdvisorBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let report = execute_adjust(&config, database, builder)?;
    write_json(writer, &report)
}

pub(crate) fn execute_adjust(
    config: &AdjustConfig,
    database: &Utf8Path,
    builder: &dyn AdvisorBuilder,
) -> Result<AdjustReport, CliError> {
    let store: Arc<dyn PerformanceStore> = Arc::new(open_store(database)?);
    let advisor = builder.build(&config.advisor)?;
    let weights = LiveWeights::restore(store.as_ref(), MetricWeights::default());
    let adjuster = WeightAdjuster::new(
        store,
        advisor,
        weights,
        Arc::new(SystemClock),
        config.adjustment.clone(),
    );
    let outcome = runtime()?.block_on(adjuster.run_cycle());
    Ok(AdjustReport::new(outcome, adjuster.weights().snapshot()))
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<AdjustConfig, CliError> {
    let merged = AdjustArgs::merge_from_layers(layers).map_err(CliError::from)?;
    AdjustConfig::try_from(merged)
}
