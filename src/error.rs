//! Admission error taxonomy.

use thiserror::Error;

/// Errors returned by [`CircuitBreaker::allow`](crate::CircuitBreaker::allow).
///
/// Exactly two kinds are observable: a permanent one after shutdown and a
/// transient one while the circuit is rejecting traffic. Lost internal
/// compare-and-swap races are never surfaced; they mean another caller
/// already performed the same transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BreakerError {
    /// The breaker was stopped and will never admit another execution.
    #[error("circuit breaker is stopped")]
    CircuitStopped,

    /// The circuit is open (or half-open with the probe already taken).
    /// Recoverable: admission resumes after the break duration elapses.
    #[error("circuit breaker is open")]
    CircuitOpen,
}
