//! Breaker configuration.
//!
//! # Design Decisions
//! - All fields have defaults; `Configuration::default()` is a working setup
//! - Invalid values are clamped to their default, never rejected: a breaker
//!   construction must not fail
//! - Durations are truncated to whole seconds before validation
//! - The trip policy is an `Arc`'d closure so callers can wrap or replace it

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default number of buckets in the rolling window.
pub const DEFAULT_NUM_BUCKETS: usize = 10;

/// Default duration covered by a single bucket.
pub const DEFAULT_BUCKET_DURATION: Duration = Duration::from_secs(1);

/// Default time the circuit stays open before probing recovery.
pub const DEFAULT_DURATION_OF_BREAK: Duration = Duration::from_secs(5);

/// Decides whether the circuit should trip, given the rolling window's
/// aggregated `(executions, failures)`. Evaluated on every failure reported
/// while the circuit is closed.
pub type TripPolicy = Arc<dyn Fn(u64, u64) -> bool + Send + Sync>;

/// Default trip policy: trip once there have been at least 20 executions in
/// the rolling window and at least half of them failed. The sample-size
/// floor keeps a couple of failures on a quiet window from opening the
/// circuit.
pub fn default_trip_policy(executions: u64, failures: u64) -> bool {
    executions >= 20 && failures * 2 >= executions
}

/// Configuration for a [`CircuitBreaker`](crate::CircuitBreaker).
///
/// Immutable once the breaker is built. Out-of-range values are silently
/// replaced by their defaults (see [`Configuration::normalized`]).
#[derive(Clone)]
pub struct Configuration {
    /// Number of buckets in the rolling window (minimum 1).
    pub num_buckets: usize,

    /// Time span of one bucket; the rolling window covers
    /// `num_buckets * bucket_duration` (minimum 1s, whole seconds).
    pub bucket_duration: Duration,

    /// How long the circuit stays open before the half-open probe
    /// (minimum 1s, whole seconds).
    pub duration_of_break: Duration,

    /// Policy consulted on closed-state failures.
    pub trip_policy: TripPolicy,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            num_buckets: DEFAULT_NUM_BUCKETS,
            bucket_duration: DEFAULT_BUCKET_DURATION,
            duration_of_break: DEFAULT_DURATION_OF_BREAK,
            trip_policy: Arc::new(default_trip_policy),
        }
    }
}

impl Configuration {
    /// Return a copy with every invalid field clamped to its default.
    ///
    /// Durations are truncated to whole seconds first, so `1.5s` becomes
    /// `1s` while `0.5s` falls below the minimum and becomes the default.
    pub fn normalized(&self) -> Self {
        let mut config = self.clone();

        if config.num_buckets == 0 {
            config.num_buckets = DEFAULT_NUM_BUCKETS;
        }

        config.bucket_duration = truncate_to_secs(config.bucket_duration)
            .unwrap_or(DEFAULT_BUCKET_DURATION);
        config.duration_of_break = truncate_to_secs(config.duration_of_break)
            .unwrap_or(DEFAULT_DURATION_OF_BREAK);

        config
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("num_buckets", &self.num_buckets)
            .field("bucket_duration", &self.bucket_duration)
            .field("duration_of_break", &self.duration_of_break)
            .field("trip_policy", &"<fn>")
            .finish()
    }
}

/// Truncate to whole seconds; `None` when the result is below one second.
fn truncate_to_secs(duration: Duration) -> Option<Duration> {
    match duration.as_secs() {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    }
}
