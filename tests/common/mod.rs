//! Shared helpers for the breaker integration tests.

use std::sync::Arc;
use std::time::Duration;

use tripswitch::{CircuitBreaker, Configuration, State};

/// Configuration that opens the circuit on the first reported failure.
#[allow(dead_code)]
pub fn trip_on_first_failure() -> Configuration {
    Configuration {
        duration_of_break: Duration::from_secs(1),
        trip_policy: Arc::new(|_, failures| failures >= 1),
        ..Default::default()
    }
}

/// Configuration whose policy never trips.
#[allow(dead_code)]
pub fn never_trip() -> Configuration {
    Configuration {
        trip_policy: Arc::new(|_, _| false),
        ..Default::default()
    }
}

/// Poll until the breaker reaches `expected`, panicking after `timeout`.
#[allow(dead_code)]
pub async fn wait_for_state(breaker: &CircuitBreaker, expected: State, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    while breaker.state() != expected {
        if tokio::time::Instant::now() >= deadline {
            panic!(
                "breaker did not reach {expected} within {timeout:?}, still {}",
                breaker.state()
            );
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
