//! Metrics adapter for a circuit breaker.
//!
//! # Responsibilities
//! - Periodically sample a breaker's state and counters
//! - Publish the sample through the `metrics` facade
//!
//! # Metrics
//! - `circuit_breaker_open` (gauge): 0 when closed, 1 otherwise
//! - `circuit_breaker_sliding_failure_rate` (gauge): rolling failures /
//!   rolling executions, 0 when the window is empty
//! - `circuit_breaker_executions_total` (counter): lifetime executions,
//!   labelled `status` = success | failure | rejected
//!
//! # Design Decisions
//! - The adapter never mutates breaker state; it reads the same accessors
//!   any caller could
//! - Published as absolute values sampled on an interval, matching the
//!   pull-style exporters the facade typically backs onto
//! - The sampling task exits when the breaker stops

use std::time::Duration;

use metrics::{counter, gauge};
use thiserror::Error;
use tokio::time;

use crate::breaker::{CircuitBreaker, State};

/// Gauge name: one if the circuit is not in the closed state.
pub const OPEN_GAUGE: &str = "circuit_breaker_open";

/// Gauge name: the sliding failure rate seen by the circuit breaker.
pub const SLIDING_FAILURE_RATE_GAUGE: &str = "circuit_breaker_sliding_failure_rate";

/// Counter name: number of executions, split by status label.
pub const EXECUTIONS_COUNTER: &str = "circuit_breaker_executions_total";

/// Label carrying the breaker name.
pub const NAME_LABEL: &str = "name";

/// Label carrying the execution status (success, failure, rejected).
pub const STATUS_LABEL: &str = "status";

/// The breaker name passed to [`publish`] is not usable as a label value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid circuit breaker name: {0:?}")]
pub struct InvalidNameError(pub String);

/// A point-in-time reading of a breaker's telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// 0.0 when closed, 1.0 in any other state.
    pub open: f64,
    /// Rolling failures over rolling executions; 0.0 on an empty window.
    pub sliding_failure_rate: f64,
    /// Lifetime executions that were reported successful.
    pub successes: u64,
    /// Lifetime executions that were reported failed.
    pub failures: u64,
    /// Lifetime executions denied admission.
    pub rejected: u64,
}

impl Sample {
    /// Read a sample off the breaker's accessor surface.
    pub fn take(breaker: &CircuitBreaker) -> Self {
        let open = if breaker.state() == State::Closed {
            0.0
        } else {
            1.0
        };

        let (rolling_executions, rolling_failures) = breaker.rolling_counters();
        let sliding_failure_rate = if rolling_executions == 0 {
            0.0
        } else {
            rolling_failures as f64 / rolling_executions as f64
        };

        let (executions, failures) = breaker.totals();

        Self {
            open,
            sliding_failure_rate,
            // Counter walks are not linearizable; clamp the difference.
            successes: executions.saturating_sub(failures),
            failures,
            rejected: breaker.rejected(),
        }
    }
}

/// Start a background task publishing `breaker`'s telemetry under `name`
/// every `sample_interval`.
///
/// The task stops together with the breaker. Returns an error when `name`
/// is empty or contains control characters, since such a name is not a
/// usable label value.
pub fn publish(
    name: &str,
    breaker: &CircuitBreaker,
    sample_interval: Duration,
) -> Result<(), InvalidNameError> {
    if !is_valid_name(name) {
        return Err(InvalidNameError(name.to_string()));
    }

    let name = name.to_string();
    let breaker = breaker.clone();
    let mut shutdown = breaker.shutdown_signal();

    tokio::spawn(async move {
        let open = gauge!(OPEN_GAUGE, NAME_LABEL => name.clone());
        let failure_rate = gauge!(SLIDING_FAILURE_RATE_GAUGE, NAME_LABEL => name.clone());
        let successes = counter!(
            EXECUTIONS_COUNTER,
            NAME_LABEL => name.clone(),
            STATUS_LABEL => "success"
        );
        let failures = counter!(
            EXECUTIONS_COUNTER,
            NAME_LABEL => name.clone(),
            STATUS_LABEL => "failure"
        );
        let rejected = counter!(
            EXECUTIONS_COUNTER,
            NAME_LABEL => name.clone(),
            STATUS_LABEL => "rejected"
        );

        let mut ticker = time::interval(sample_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => break,
            }

            let sample = Sample::take(&breaker);
            open.set(sample.open);
            failure_rate.set(sample.sliding_failure_rate);
            successes.absolute(sample.successes);
            failures.absolute(sample.failures);
            rejected.absolute(sample.rejected);

            if breaker.state() == State::Stopped {
                break;
            }
        }
        tracing::debug!(breaker = %name, "metrics sampler exited");
    });

    Ok(())
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| !c.is_control())
}
