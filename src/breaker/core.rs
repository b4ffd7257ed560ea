//! The breaker state machine and its background tasks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time;

use crate::breaker::shutdown::Shutdown;
use crate::breaker::state::{AtomicState, State};
use crate::breaker::window::{Counters, RollingWindow};
use crate::config::Configuration;
use crate::error::BreakerError;

/// Shared breaker state. Owned by the [`CircuitBreaker`] handles, the
/// outstanding [`Reporter`]s and the two background tasks; every field is
/// mutated through atomics only.
#[derive(Debug)]
struct Core {
    configuration: Configuration,
    state: AtomicState,
    window: RollingWindow,
    totals: Counters,
    rejected: AtomicU64,
    half_open_permit: AtomicBool,
    shutdown: Shutdown,
}

/// An admission-controlling circuit breaker.
///
/// Cheap to clone; all clones observe and mutate the same breaker. Starts
/// closed and spawns the window advancer task, so construction must happen
/// inside a Tokio runtime.
#[derive(Clone, Debug)]
pub struct CircuitBreaker {
    core: Arc<Core>,
}

impl CircuitBreaker {
    /// Build a breaker from `configuration`, clamping invalid fields to
    /// their defaults.
    pub fn new(configuration: Configuration) -> Self {
        let configuration = configuration.normalized();
        let core = Arc::new(Core {
            window: RollingWindow::new(configuration.num_buckets),
            configuration,
            state: AtomicState::new(State::Closed),
            totals: Counters::default(),
            rejected: AtomicU64::new(0),
            half_open_permit: AtomicBool::new(false),
            shutdown: Shutdown::new(),
        });

        Core::spawn_window_advancer(&core);

        Self { core }
    }

    /// The normalized configuration the breaker was built with.
    pub fn configuration(&self) -> &Configuration {
        &self.core.configuration
    }

    /// Ask for admission of one execution.
    ///
    /// On success the caller receives a [`Reporter`] bound to the state
    /// observed here and must report the outcome once the execution
    /// finishes. Denied attempts return [`BreakerError::CircuitOpen`] and
    /// count as rejections, except after [`stop`](Self::stop) where they
    /// return [`BreakerError::CircuitStopped`] without counting.
    pub fn allow(&self) -> Result<Reporter, BreakerError> {
        match self.core.state.load() {
            State::Stopped => return Err(BreakerError::CircuitStopped),
            State::Closed => return Ok(self.reporter(State::Closed)),
            State::HalfOpen if self.core.take_half_open_permit() => {
                return Ok(self.reporter(State::HalfOpen));
            }
            State::HalfOpen | State::Open => {}
        }

        self.core.rejected.fetch_add(1, Ordering::Relaxed);
        Err(BreakerError::CircuitOpen)
    }

    /// Current state. Eventually consistent under concurrent transitions.
    pub fn state(&self) -> State {
        self.core.state.load()
    }

    /// Lifetime (executions, failures) reported to the breaker. Exact, and
    /// never reset by state transitions.
    pub fn totals(&self) -> (u64, u64) {
        (self.core.totals.executions(), self.core.totals.failures())
    }

    /// Number of executions denied admission.
    pub fn rejected(&self) -> u64 {
        self.core.rejected.load(Ordering::Relaxed)
    }

    /// Aggregated (executions, failures) over the rolling window.
    ///
    /// Not a linearizable snapshot: a concurrent report or bucket rotation
    /// may interleave with the walk.
    pub fn rolling_counters(&self) -> (u64, u64) {
        self.core.window.aggregate()
    }

    /// Shut the breaker down: every later [`allow`](Self::allow) returns
    /// [`BreakerError::CircuitStopped`] and the background tasks exit.
    /// Idempotent and irreversible.
    pub fn stop(&self) {
        self.core.state.store(State::Stopped);
        self.core.shutdown.trigger();
        tracing::debug!("circuit breaker stopped");
    }

    fn reporter(&self, bound: State) -> Reporter {
        Reporter {
            core: Arc::clone(&self.core),
            bound,
        }
    }

    /// Shutdown signal shared with collaborators such as the metrics
    /// sampler.
    pub(crate) fn shutdown_signal(&self) -> broadcast::Receiver<()> {
        self.core.shutdown.subscribe()
    }
}

/// One-shot outcome callback handed out by [`CircuitBreaker::allow`].
///
/// Bound to the breaker state observed at admission time; if the breaker
/// has since transitioned, the report is silently discarded so feedback
/// from a previous window cannot corrupt the current one. Dropping a
/// reporter without calling [`report`](Self::report) counts nothing.
#[derive(Debug)]
pub struct Reporter {
    core: Arc<Core>,
    bound: State,
}

impl Reporter {
    /// Report whether the admitted execution succeeded.
    pub fn report(self, success: bool) {
        self.core.handle_report(self.bound, success);
    }
}

impl Core {
    fn handle_report(self: &Arc<Self>, bound: State, success: bool) {
        let state = self.state.load();
        if state != bound {
            // Stale feedback from a since-transitioned window.
            return;
        }

        match state {
            State::Closed => {
                self.totals.record_execution();
                self.window.current().record_execution();
                if !success {
                    self.totals.record_failure();
                    self.window.current().record_failure();

                    let (executions, failures) = self.window.aggregate();
                    if (self.configuration.trip_policy)(executions, failures) {
                        self.trip_from(State::Closed);
                    }
                }
            }
            State::HalfOpen => {
                if success {
                    self.close_from(State::HalfOpen);
                } else {
                    self.trip_from(State::HalfOpen);
                }
            }
            State::Stopped | State::Open => {}
        }
    }

    /// CAS-guarded transition into Open. Of several racing trip
    /// evaluations exactly one wins and arms the recovery timer.
    fn trip_from(self: &Arc<Self>, prior: State) {
        if !self.state.transition(prior, State::Open) {
            return;
        }
        tracing::warn!(
            from = %prior,
            break_for = ?self.configuration.duration_of_break,
            "circuit opened"
        );
        self.arm_recovery_timer();
    }

    /// CAS-guarded transition back into Closed, resetting the rolling
    /// window so the new closed period starts from a clean slate. Lifetime
    /// totals are left untouched.
    fn close_from(self: &Arc<Self>, prior: State) {
        if !self.state.transition(prior, State::Closed) {
            return;
        }
        self.window.reset();
        tracing::info!(from = %prior, "circuit closed");
    }

    fn take_half_open_permit(&self) -> bool {
        self.half_open_permit
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// One-shot timer moving Open → HalfOpen after the break duration.
    ///
    /// Only the winner of the transition into Open arms it, so it can never
    /// be armed twice for the same break. If the breaker left Open before
    /// the timer fires (only possible via `stop`), the CAS fails and no
    /// probe permit is granted.
    fn arm_recovery_timer(self: &Arc<Self>) {
        let core = Arc::clone(self);
        let mut shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep(core.configuration.duration_of_break) => {
                    if core.state.transition(State::Open, State::HalfOpen) {
                        core.half_open_permit.store(true, Ordering::Release);
                        tracing::info!("circuit half-open, probing recovery");
                    }
                }
                _ = shutdown.recv() => {}
            }
        });
    }

    /// Background task rotating the rolling window every bucket duration.
    ///
    /// Runs regardless of breaker state so stale history keeps draining
    /// while the circuit is open, and exits on shutdown.
    fn spawn_window_advancer(core: &Arc<Self>) {
        let core = Arc::clone(core);
        let mut shutdown = core.shutdown.subscribe();

        tokio::spawn(async move {
            let period = core.configuration.bucket_duration;
            // interval() fires immediately; the first rotation belongs one
            // full bucket from now.
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if core.state.load() == State::Stopped {
                            break;
                        }
                        core.window.advance();
                    }
                    _ = shutdown.recv() => break,
                }
            }
        });
    }
}
