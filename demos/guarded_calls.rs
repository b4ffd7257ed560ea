//! Guard a flaky downstream with a circuit breaker and watch it cycle.
//!
//! Run with `cargo run --example guarded_calls`, then curl
//! `http://127.0.0.1:9000/metrics` for the exported breaker telemetry.

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;
use tripswitch::observability::metrics::publish;
use tripswitch::{BreakerError, CircuitBreaker, Configuration};

/// A downstream that goes down for a stretch and then recovers.
async fn call_downstream(call: u32) -> Result<(), &'static str> {
    tokio::time::sleep(Duration::from_millis(20)).await;
    if (40..120).contains(&call) {
        Err("downstream unavailable")
    } else {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("info,tripswitch=debug")
        .init();

    PrometheusBuilder::new()
        .with_http_listener(([127, 0, 0, 1], 9000))
        .install()?;

    let breaker = CircuitBreaker::new(Configuration {
        duration_of_break: Duration::from_secs(2),
        trip_policy: Arc::new(|executions, failures| executions >= 10 && failures * 2 >= executions),
        ..Default::default()
    });
    publish("downstream", &breaker, Duration::from_secs(1))?;

    for call in 0..300u32 {
        match breaker.allow() {
            Ok(reporter) => {
                let outcome = call_downstream(call).await;
                if let Err(reason) = outcome {
                    tracing::warn!(call, reason, "downstream call failed");
                }
                reporter.report(outcome.is_ok());
            }
            Err(BreakerError::CircuitOpen) => {
                tracing::info!(call, "rejected, failing fast");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            Err(BreakerError::CircuitStopped) => break,
        }
    }

    let (executions, failures) = breaker.totals();
    tracing::info!(executions, failures, rejected = breaker.rejected(), "done");
    breaker.stop();
    Ok(())
}
