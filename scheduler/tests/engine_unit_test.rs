use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use scheduler::{DebounceScheduler, Phase, SchedulerConfig, UpdateJob};

/// Counts runs; optionally stays busy for `hold` to simulate slow renames.
struct CountingJob {
    runs: AtomicUsize,
    hold: Duration,
}

impl CountingJob {
    fn new() -> Arc<Self> {
        Self::holding(Duration::ZERO)
    }

    fn holding(hold: Duration) -> Arc<Self> {
        Arc::new(Self {
            runs: AtomicUsize::new(0),
            hold,
        })
    }

    fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpdateJob for CountingJob {
    async fn run(&self) {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if !self.hold.is_zero() {
            sleep(self.hold).await;
        }
    }
}

fn secs(n: u64) -> SchedulerConfig {
    SchedulerConfig::new(Duration::from_secs(n))
}

/// Lets spawned executions run without moving the paused clock.
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn single_request_executes_on_the_leading_edge() {
    let job = CountingJob::new();
    let sched = DebounceScheduler::new(secs(5), job.clone());

    sched.request();

    // Initiated synchronously, before the caller yields.
    assert_eq!(sched.executions_started(), 1);
    assert_eq!(sched.phase(), Phase::Cooling);

    settle().await;
    assert_eq!(job.runs(), 1);
}

#[tokio::test(start_paused = true)]
async fn burst_produces_one_leading_and_one_trailing_execution() {
    let job = CountingJob::new();
    let sched = DebounceScheduler::new(secs(5), job.clone());

    for _ in 0..50 {
        sched.request();
    }
    settle().await;

    assert_eq!(job.runs(), 1, "only the leading edge runs inside the window");
    assert_eq!(sched.phase(), Phase::CoolingPending);

    sleep(Duration::from_millis(5_001)).await;
    assert_eq!(job.runs(), 2, "exactly one trailing execution after the window");

    // The trailing execution opened a new window that closes quietly.
    assert_eq!(sched.phase(), Phase::Cooling);
    sleep(Duration::from_secs(30)).await;
    assert_eq!(job.runs(), 2);
    assert_eq!(sched.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn no_requests_no_executions() {
    let job = CountingJob::new();
    let sched = DebounceScheduler::new(secs(5), job.clone());

    sleep(Duration::from_secs(3_600)).await;

    assert_eq!(job.runs(), 0);
    assert_eq!(sched.executions_started(), 0);
    assert_eq!(sched.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn zero_cooldown_executes_every_request() {
    let job = CountingJob::new();
    let sched = DebounceScheduler::new(SchedulerConfig::new(Duration::ZERO), job.clone());

    for _ in 0..100 {
        sched.request();
    }
    assert_eq!(sched.executions_started(), 100);

    settle().await;
    assert_eq!(job.runs(), 100);
    assert_eq!(sched.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn invalid_cooldown_values_disable_debouncing() {
    for secs in [-3.0, f64::NAN, f64::INFINITY] {
        let cfg = SchedulerConfig::from_secs_f64(secs);
        assert!(cfg.is_disabled(), "{secs} should disable debouncing");

        let job = CountingJob::new();
        let sched = DebounceScheduler::new(cfg, job.clone());
        sched.request();
        sched.request();
        settle().await;

        assert_eq!(job.runs(), 2);
    }
}

#[tokio::test(start_paused = true)]
async fn request_after_trailing_execution_waits_a_full_new_window() {
    let job = CountingJob::new();
    let sched = DebounceScheduler::new(secs(5), job.clone());

    sched.request();
    sched.request();
    sleep(Duration::from_millis(5_001)).await;
    assert_eq!(job.runs(), 2);

    // Right after the trailing edge: must coalesce, not execute.
    sched.request();
    settle().await;
    assert_eq!(job.runs(), 2);
    assert_eq!(sched.phase(), Phase::CoolingPending);

    // The new window started at t=5s, so nothing fires before t=10s.
    sleep(Duration::from_millis(4_900)).await;
    assert_eq!(job.runs(), 2);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(job.runs(), 3);
}

#[tokio::test(start_paused = true)]
async fn request_after_quiet_window_executes_immediately() {
    let job = CountingJob::new();
    let sched = DebounceScheduler::new(secs(5), job.clone());

    sched.request();
    sleep(Duration::from_secs(6)).await;
    assert_eq!(sched.phase(), Phase::Idle);

    sched.request();
    settle().await;
    assert_eq!(job.runs(), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_executions_may_overlap() {
    let job = CountingJob::holding(Duration::from_secs(8));
    let sched = DebounceScheduler::new(secs(5), job.clone());

    sched.request();
    sched.request();
    settle().await;
    assert_eq!(sched.in_flight(), 1);

    // Trailing edge at t=5s while the first run is busy until t=8s.
    sleep(Duration::from_millis(5_001)).await;
    assert_eq!(job.runs(), 2);
    assert_eq!(sched.in_flight(), 2);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(sched.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn clones_drive_the_same_state_machine() {
    let job = CountingJob::new();
    let sched = DebounceScheduler::new(secs(5), job.clone());
    let other = sched.clone();

    sched.request();
    other.request();
    other.request();
    settle().await;

    assert_eq!(job.runs(), 1);
    assert_eq!(sched.requests_received(), 3);
    assert_eq!(other.phase(), Phase::CoolingPending);
}

#[tokio::test(start_paused = true)]
async fn close_drops_the_pending_trailing_update() {
    let job = CountingJob::new();
    let sched = DebounceScheduler::new(secs(5), job.clone());

    sched.request();
    sched.request();
    settle().await;
    assert_eq!(sched.phase(), Phase::CoolingPending);

    sched.close();
    tokio::time::advance(Duration::from_millis(5_001)).await;
    settle().await;

    assert!(sched.is_closed());
    assert_eq!(job.runs(), 1);
    assert_eq!(sched.executions_started(), 1);
}

#[tokio::test(start_paused = true)]
async fn requests_after_close_never_execute() {
    let job = CountingJob::new();
    let sched = DebounceScheduler::new(SchedulerConfig::new(Duration::ZERO), job.clone());

    sched.close();
    for _ in 0..10 {
        sched.request();
    }
    settle().await;

    assert_eq!(job.runs(), 0);
    assert_eq!(sched.phase(), Phase::Idle);
}
