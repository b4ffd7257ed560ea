//! Circuit breaker state machine.
//!
//! # States
//! - Closed: normal operation, every call admitted
//! - Open: downstream assumed down, every call rejected
//! - HalfOpen: single probe admitted to test recovery
//! - Stopped: breaker shut down, terminal
//!
//! # State Transitions
//! ```text
//! Closed → Open: trip policy fires on a reported failure
//! Open → HalfOpen: recovery timer fires after duration_of_break
//! HalfOpen → Closed: probe reports success (rolling window reset)
//! HalfOpen → Open: probe reports failure (break re-armed)
//! any → Stopped: stop()
//! ```
//!
//! # Design Decisions
//! - Every cross-state transition is a compare-and-swap guarded on the
//!   expected prior state; exactly one of several racing actors wins
//! - The half-open probe permit is an atomic test-and-clear, so at most one
//!   caller is admitted per arming
//! - Outcome reports carry the state observed at admission time; reports
//!   whose bound state no longer matches are discarded, keeping feedback
//!   from a previous window out of the current one

pub mod core;
pub mod state;
pub mod window;

mod shutdown;

pub use self::core::{CircuitBreaker, Reporter};
pub use self::state::State;
