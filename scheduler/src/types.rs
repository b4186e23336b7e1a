//! Shared types used by the scheduler subsystem.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

/// Configuration knobs for the debounce scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Length of the coalescing window that follows every execution.
    ///
    /// `Duration::ZERO` disables debouncing: every request executes.
    pub cooldown: Duration,
}

impl SchedulerConfig {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    /// Builds a config from a seconds value read out of user configuration.
    ///
    /// Negative, NaN, infinite and unrepresentably large values are treated
    /// as "disabled" rather than rejected.
    pub fn from_secs_f64(secs: f64) -> Self {
        Self {
            cooldown: Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.cooldown.is_zero()
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

/// Observable phase of the scheduler state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Cooling,
    CoolingPending,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Cooling => "cooling",
            Phase::CoolingPending => "cooling_pending",
        };
        f.write_str(s)
    }
}

/// Outcome of feeding one request into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Debouncing is disabled; execute without touching the window.
    ExecuteNow,
    /// Leading edge: execute and open a new cooldown window.
    ExecuteAndArm,
    /// First request inside a window; a trailing execution is now owed.
    MarkPending,
    /// A trailing execution is already owed; nothing changes.
    Absorbed,
}

impl Decision {
    pub fn executes(&self) -> bool {
        matches!(self, Decision::ExecuteNow | Decision::ExecuteAndArm)
    }
}

/// The single action a scheduler fires.
///
/// Implementations own their own error handling: the scheduler only decides
/// *when* to run, never whether a run succeeded.
#[async_trait]
pub trait UpdateJob: Send + Sync + 'static {
    async fn run(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_seconds_become_the_cooldown() {
        let cfg = SchedulerConfig::from_secs_f64(2.5);

        assert_eq!(cfg.cooldown, Duration::from_millis(2_500));
        assert!(!cfg.is_disabled());
    }

    #[test]
    fn out_of_range_seconds_disable_debouncing() {
        for secs in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e30] {
            assert!(
                SchedulerConfig::from_secs_f64(secs).is_disabled(),
                "{secs} should disable"
            );
        }
    }
}
