//! Race tests on a multi-threaded runtime with real time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Barrier;
use tripswitch::{CircuitBreaker, State};

mod common;

const HALF_OPEN_WAIT: Duration = Duration::from_secs(3);

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_exactly_one_half_open_grant() {
    let breaker = CircuitBreaker::new(common::trip_on_first_failure());
    breaker.allow().unwrap().report(false);
    assert_eq!(breaker.state(), State::Open);

    common::wait_for_state(&breaker, State::HalfOpen, HALF_OPEN_WAIT).await;
    let rejected_before = breaker.rejected();

    const CONTENDERS: usize = 32;
    let barrier = Arc::new(Barrier::new(CONTENDERS));
    let mut handles = Vec::with_capacity(CONTENDERS);
    for _ in 0..CONTENDERS {
        let breaker = breaker.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            breaker.allow()
        }));
    }

    let mut grants = Vec::new();
    let mut rejections = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(reporter) => grants.push(reporter),
            Err(err) => {
                assert_eq!(err, tripswitch::BreakerError::CircuitOpen);
                rejections += 1;
            }
        }
    }

    assert_eq!(grants.len(), 1, "exactly one contender gets the probe");
    assert_eq!(rejections, CONTENDERS - 1);
    assert_eq!(breaker.rejected(), rejected_before + rejections as u64);

    // The single probe closing the circuit proves the grant was usable.
    grants.pop().unwrap().report(true);
    assert_eq!(breaker.state(), State::Closed);

    breaker.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_lifetime_totals_are_exact_under_contention() {
    const TASKS: usize = 8;
    const REPORTS_PER_TASK: usize = 500;
    const FAILURES_PER_TASK: usize = 100;

    let breaker = CircuitBreaker::new(common::never_trip());

    let barrier = Arc::new(Barrier::new(TASKS));
    let mut handles = Vec::with_capacity(TASKS);
    for _ in 0..TASKS {
        let breaker = breaker.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            for i in 0..REPORTS_PER_TASK {
                let reporter = breaker.allow().expect("closed breaker admits everyone");
                reporter.report(i >= FAILURES_PER_TASK);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let expected_executions = (TASKS * REPORTS_PER_TASK) as u64;
    let expected_failures = (TASKS * FAILURES_PER_TASK) as u64;
    assert_eq!(breaker.totals(), (expected_executions, expected_failures));
    assert_eq!(breaker.rejected(), 0);
    assert_eq!(breaker.state(), State::Closed);

    breaker.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_racing_trips_produce_a_single_open_cycle() {
    let breaker = CircuitBreaker::new(common::trip_on_first_failure());

    // Hand out a batch of closed-bound reporters, then fail them all at
    // once: one trip wins, the rest are stale or lost CAS races.
    let reporters: Vec<_> = (0..16).map(|_| breaker.allow().unwrap()).collect();

    let barrier = Arc::new(Barrier::new(reporters.len()));
    let mut handles = Vec::new();
    for reporter in reporters {
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            reporter.report(false);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(breaker.state(), State::Open);

    // A single recovery cycle follows: one permit, one probe, closed again.
    common::wait_for_state(&breaker, State::HalfOpen, HALF_OPEN_WAIT).await;
    let probe = breaker.allow().unwrap();
    assert!(breaker.allow().is_err());
    probe.report(true);
    assert_eq!(breaker.state(), State::Closed);

    breaker.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_stop_races_with_in_flight_callers() {
    let breaker = CircuitBreaker::new(common::never_trip());

    let barrier = Arc::new(Barrier::new(9));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let breaker = breaker.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            for _ in 0..200 {
                if let Ok(reporter) = breaker.allow() {
                    reporter.report(true);
                }
            }
        }));
    }

    let stopper = {
        let breaker = breaker.clone();
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            barrier.wait().await;
            breaker.stop();
        })
    };

    for handle in handles {
        handle.await.unwrap();
    }
    stopper.await.unwrap();

    // Whatever interleaving happened, the breaker ends up stopped and the
    // successful reports all landed in the lifetime totals.
    assert_eq!(breaker.state(), State::Stopped);
    let (executions, failures) = breaker.totals();
    assert!(executions <= 1600);
    assert_eq!(failures, 0);

    breaker.stop();
}
