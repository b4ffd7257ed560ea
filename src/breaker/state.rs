//! Breaker state enum and its atomic cell.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// State of a circuit breaker.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Shut down; rejects every execution. Terminal.
    Stopped = 0,
    /// Admitting every execution.
    Closed = 1,
    /// Testing whether the circuit should reset or open again.
    HalfOpen = 2,
    /// Rejecting every execution.
    Open = 3,
}

impl From<u8> for State {
    fn from(val: u8) -> Self {
        match val {
            1 => State::Closed,
            2 => State::HalfOpen,
            3 => State::Open,
            _ => State::Stopped,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Stopped => "stopped",
            State::Closed => "closed",
            State::HalfOpen => "half-open",
            State::Open => "open",
        };
        f.write_str(name)
    }
}

/// Atomically readable/writable [`State`] cell.
#[derive(Debug)]
pub(crate) struct AtomicState(AtomicU8);

impl AtomicState {
    pub(crate) fn new(state: State) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> State {
        State::from(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: State) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Transition `from` → `to`; fails if another actor moved the state
    /// away from `from` first.
    pub(crate) fn transition(&self, from: State, to: State) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
