//! Observability adapters.
//!
//! The breaker itself only emits `tracing` events on state transitions;
//! everything here is read-only over the breaker's accessor surface.

pub mod metrics;
