//! Debounce state machine.
//
//  This module is deliberately pure: no async, no IO, no clock.
//  The engine owns timers and feeds their expiry back in here.

use super::types::{Decision, Phase};

/// `cooling`/`pending` flags of one scheduler instance.
///
/// Invariant: `pending` implies `cooling`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchedulerState {
    cooling: bool,
    pending: bool,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        match (self.cooling, self.pending) {
            (false, _) => Phase::Idle,
            (true, false) => Phase::Cooling,
            (true, true) => Phase::CoolingPending,
        }
    }

    /// Applies one "something changed" request.
    ///
    /// With `debounce == false` every request executes and the flags are
    /// left untouched.
    pub fn on_request(&mut self, debounce: bool) -> Decision {
        if !debounce {
            return Decision::ExecuteNow;
        }

        match self.phase() {
            Phase::Idle => {
                self.cooling = true;
                Decision::ExecuteAndArm
            }
            Phase::Cooling => {
                self.pending = true;
                Decision::MarkPending
            }
            Phase::CoolingPending => Decision::Absorbed,
        }
    }

    /// Closes the current window.
    ///
    /// Returns `true` when requests were coalesced during the window; the
    /// caller must then issue one more request, which re-enters the leading
    /// edge and opens a fresh window.
    pub fn on_cooldown_elapsed(&mut self) -> bool {
        self.cooling = false;
        std::mem::take(&mut self.pending)
    }
}
