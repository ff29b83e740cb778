//! Weight adjustment for the carpool scoring engine.
//!
//! [`WeightAdjuster`] turns recorded trip outcomes into small, bounded
//! changes to the live scoring weights. Each cycle is gated on enough new
//! completed trips and enough elapsed time, asks a [`WeightAdvisor`] for a
//! proposal, and refuses anything that is not a valid weight vector. An
//! accepted proposal is clamped per axis, blended into the current weights,
//! audited, and only then swapped live.
//!
//! [`AdjustmentScheduler`] drives cycles from a timer until cancelled.
//!
//! [`WeightAdvisor`]: carpool_core::WeightAdvisor

#![forbid(unsafe_code)]

mod adjuster;
mod analysis;
mod clamp;
mod config;
mod scheduler;

pub use adjuster::{CycleOutcome, SkipReason, WeightAdjuster};
pub use analysis::{DISTANCE_METRIC, MIN_TREND_RECORDS, TIME_METRIC, TREND_BAND, analyse, pearson};
pub use clamp::{ValidationError, WeightPlan, blend, clamp_axes, plan_adjustment, validate_proposal};
pub use config::AdjustmentConfig;
pub use scheduler::{AdjustmentScheduler, MIN_PERIOD};
