//! Time-bucketed rolling window of execution counters.
//!
//! # Responsibilities
//! - Track (executions, failures) per bucket with atomic increments
//! - Rotate the current bucket on a fixed tick so history ages out
//! - Aggregate all buckets into the rolling totals
//!
//! # Design Decisions
//! - Aggregation is a walk over the buckets, not an atomic snapshot; a
//!   concurrent increment or rotation may interleave. The rolling numbers
//!   feed a statistical trip decision, so a transient over/under-count at a
//!   tick boundary is accepted. Exact lifetime counts live elsewhere.
//! - Rotation clears the target bucket *before* publishing the new index,
//!   so no increment can land in a bucket that is about to be wiped

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// A pair of monotonically incremented execution/failure tallies.
///
/// Used both for the window buckets and for the breaker's lifetime totals.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    executions: AtomicU64,
    failures: AtomicU64,
}

impl Counters {
    pub(crate) fn record_execution(&self) {
        self.executions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn executions(&self) -> u64 {
        self.executions.load(Ordering::Relaxed)
    }

    pub(crate) fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub(crate) fn reset(&self) {
        self.executions.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
    }
}

/// Fixed-size cyclic sequence of buckets plus the current-bucket index.
///
/// Writers only ever touch the current bucket; the window advancer is the
/// only actor that moves the index.
#[derive(Debug)]
pub(crate) struct RollingWindow {
    buckets: Box<[Counters]>,
    current: AtomicUsize,
}

impl RollingWindow {
    pub(crate) fn new(num_buckets: usize) -> Self {
        let buckets = (0..num_buckets).map(|_| Counters::default()).collect();
        Self {
            buckets,
            current: AtomicUsize::new(0),
        }
    }

    /// The bucket currently receiving increments.
    pub(crate) fn current(&self) -> &Counters {
        &self.buckets[self.current.load(Ordering::Acquire)]
    }

    /// Rotate to the next bucket, clearing it first so a full window of
    /// history is exactly `num_buckets` rotations.
    pub(crate) fn advance(&self) {
        let current = self.current.load(Ordering::Acquire);
        let next = (current + 1) % self.buckets.len();
        self.buckets[next].reset();
        self.current.store(next, Ordering::Release);
    }

    /// Sum of (executions, failures) across every bucket.
    pub(crate) fn aggregate(&self) -> (u64, u64) {
        let mut executions = 0;
        let mut failures = 0;
        for bucket in self.buckets.iter() {
            executions += bucket.executions();
            failures += bucket.failures();
        }
        (executions, failures)
    }

    /// Zero every bucket. Used on the transition back to closed.
    pub(crate) fn reset(&self) {
        for bucket in self.buckets.iter() {
            bucket.reset();
        }
    }
}
