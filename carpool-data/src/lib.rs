//! Adapters between the carpool engine and the outside world.
//!
//! Responsibilities:
//! - Cache traffic snapshots with staleness handling and retries.
//! - Provide HTTP clients for the traffic service and the analytical advisor.
//! - Ship deterministic doubles for both seams.
//!
//! Boundaries:
//! - Do not encode scoring or adjustment rules (those live in
//!   `carpool-scorer` and `carpool-tuner`).
//! - Keep blocking I/O off async executors.
//!
//! Invariants:
//! - Thread-safe by default.
//! - No global mutable state.

#![forbid(unsafe_code)]

pub mod advisor;
pub mod traffic;

#[doc(hidden)]
pub mod test_support;
