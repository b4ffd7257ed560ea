//! Lock-free in-process circuit breaker.
//!
//! Guards calls to a failing downstream dependency: callers ask the breaker
//! for admission before every protected call and report the outcome
//! afterwards. Outcomes feed a rolling time window of per-bucket counters;
//! when the configured trip policy fires, the breaker rejects everything for
//! a break period and then probes recovery with a single trial call.
//!
//! Every public operation completes in bounded time using atomic loads,
//! stores and compare-and-swap. There is no mutex anywhere on the hot path.
//!
//! ```no_run
//! use tripswitch::{CircuitBreaker, Configuration, BreakerError};
//!
//! # async fn call_downstream() -> Result<(), ()> { Ok(()) }
//! # async fn demo() {
//! let breaker = CircuitBreaker::new(Configuration::default());
//!
//! match breaker.allow() {
//!     Ok(reporter) => {
//!         let outcome = call_downstream().await;
//!         reporter.report(outcome.is_ok());
//!     }
//!     Err(BreakerError::CircuitOpen) => { /* fail fast, retry later */ }
//!     Err(BreakerError::CircuitStopped) => { /* breaker shut down */ }
//! }
//! # }
//! ```

pub mod breaker;
pub mod config;
pub mod error;
pub mod observability;

pub use breaker::{CircuitBreaker, Reporter, State};
pub use config::{Configuration, TripPolicy};
pub use error::BreakerError;
