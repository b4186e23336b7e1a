//! The debounce scheduler engine.
//!
//! Converts a storm of "something changed" signals into a bounded sequence of
//! job executions:
//!   1. The first request after idling executes immediately (leading edge)
//!      and opens a cooldown window.
//!   2. Requests inside the window collapse into a single pending flag.
//!   3. When the window closes with the flag set, one trailing execution runs
//!      and opens a fresh window.
//!
//! Executions are detached tasks. The caller of `request()` never waits on
//! them, so an execution may still be running when the next one starts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::{Instrument, debug, info_span, trace, warn};

use super::state::SchedulerState;
use super::types::{Decision, Phase, SchedulerConfig, UpdateJob};

/// Handle to one debounce scheduler.
///
/// Cloning is cheap; all clones drive the same state machine.
pub struct DebounceScheduler<J: UpdateJob> {
    inner: Arc<Inner<J>>,
}

struct Inner<J> {
    cfg: SchedulerConfig,
    job: Arc<J>,
    state: Mutex<SchedulerState>,
    /// Set once by `close()`; read under the state lock.
    closed: AtomicBool,

    requests: AtomicU64,
    started: AtomicU64,
    in_flight: AtomicUsize,
}

impl<J: UpdateJob> Clone for DebounceScheduler<J> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<J: UpdateJob> DebounceScheduler<J> {
    pub fn new(cfg: SchedulerConfig, job: Arc<J>) -> Self {
        Self {
            inner: Arc::new(Inner {
                cfg,
                job,
                state: Mutex::new(SchedulerState::new()),
                closed: AtomicBool::new(false),
                requests: AtomicU64::new(0),
                started: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    pub fn config(&self) -> SchedulerConfig {
        self.inner.cfg
    }

    /// Signals that the observed state changed.
    ///
    /// Never blocks and never suspends. Must be called from within a Tokio
    /// runtime: executions and cooldown timers are spawned onto it.
    /// Ignored once the scheduler is closed.
    pub fn request(&self) {
        self.inner.requests.fetch_add(1, Ordering::Relaxed);

        let decision = {
            let mut state = self.inner.state.lock();
            if self.inner.closed.load(Ordering::SeqCst) {
                trace!(target: "scheduler", "request after close ignored");
                return;
            }
            state.on_request(!self.inner.cfg.is_disabled())
        };
        self.apply(decision);
    }

    /// Stops the scheduler for good: later requests are ignored and a
    /// pending trailing update is dropped when its window closes.
    /// Executions already started keep running.
    pub fn close(&self) {
        let _state = self.inner.state.lock();
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            debug!(target: "scheduler", "scheduler closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Current phase of the state machine.
    pub fn phase(&self) -> Phase {
        self.inner.state.lock().phase()
    }

    /// Total number of `request()` calls observed.
    pub fn requests_received(&self) -> u64 {
        self.inner.requests.load(Ordering::Relaxed)
    }

    /// Total number of executions started, leading and trailing.
    pub fn executions_started(&self) -> u64 {
        self.inner.started.load(Ordering::SeqCst)
    }

    /// Executions spawned but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    fn apply(&self, decision: Decision) {
        match decision {
            Decision::ExecuteNow => self.spawn_execution(),
            Decision::ExecuteAndArm => {
                self.arm_cooldown();
                self.spawn_execution();
            }
            Decision::MarkPending => {
                debug!(target: "scheduler", "cooldown active; trailing update queued")
            }
            Decision::Absorbed => {
                trace!(target: "scheduler", "request absorbed by pending trailing update")
            }
        }
    }

    fn arm_cooldown(&self) {
        let this = self.clone();
        let cooldown = self.inner.cfg.cooldown;

        debug!(
            target: "scheduler",
            cooldown_ms = cooldown.as_millis() as u64,
            "cooldown window opened"
        );

        tokio::spawn(async move {
            tokio::time::sleep(cooldown).await;
            this.on_cooldown_elapsed();
        });
    }

    /// Timer callback. The trailing request is applied under the same lock
    /// that closes the window, so no other request can claim the leading edge
    /// in between.
    fn on_cooldown_elapsed(&self) {
        let decision = {
            let mut state = self.inner.state.lock();
            if self.inner.closed.load(Ordering::SeqCst) {
                trace!(target: "scheduler", "cooldown window closed after close; trailing update dropped");
                return;
            }
            if !state.on_cooldown_elapsed() {
                trace!(target: "scheduler", "cooldown window closed; idle");
                return;
            }
            state.on_request(true)
        };

        debug!(target: "scheduler", "cooldown window closed; firing trailing update");
        self.apply(decision);
    }

    fn spawn_execution(&self) {
        let n = self.inner.started.fetch_add(1, Ordering::SeqCst) + 1;
        let running = self.inner.in_flight.fetch_add(1, Ordering::SeqCst);

        if running > 0 {
            warn!(
                target: "scheduler",
                execution = n,
                in_flight = running,
                "update started while a previous one is still running"
            );
        }

        let inner = Arc::clone(&self.inner);
        let span = info_span!("execution", execution = n);

        tokio::spawn(
            async move {
                let _guard = InFlightGuard(&inner.in_flight);
                inner.job.run().await;
            }
            .instrument(span),
        );
    }
}

/// Decrements the in-flight count even if the job panics.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
