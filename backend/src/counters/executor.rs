//! Update executor: recompute metrics, push one label per counter.
//!
//! Failure isolation:
//! - every rename is awaited independently; one failure never aborts the rest
//! - failures are classified and logged per kind, never propagated
//! - unresolved targets are skipped with a warning on every update
//!
//! The scheduler decides *when* this runs; nothing here reports back to it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use roster::{Metrics, RosterStore};
use scheduler::UpdateJob;
use tracing::{Instrument, debug, error, info, warn};

use crate::counters::rename::{ChannelRenamer, RenameError, RenameErrorKind};
use crate::counters::target::{ChannelInfo, CounterTarget, TargetKey, TargetTable, render_label};
use crate::logger::{rename_span, update_span, warn_if_slow};
use crate::metrics::counters::Counters;

const SLOW_RENAME: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOutcome {
    Renamed,
    Skipped,
    Failed(RenameErrorKind),
}

/// What one executor invocation did, in target order.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub update: u64,
    pub metrics: Metrics,
    pub outcomes: Vec<(TargetKey, TargetOutcome)>,
}

impl UpdateReport {
    pub fn outcome(&self, key: TargetKey) -> Option<TargetOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, o)| *o)
    }
}

pub struct UpdateExecutor<R: ChannelRenamer> {
    roster: RosterStore,
    targets: Arc<TargetTable>,
    renamer: Arc<R>,
    rename_timeout: Duration,

    /// Monotonic, process-local update number used to order log lines.
    updates: AtomicU64,

    counters: Counters,
}

impl<R: ChannelRenamer> UpdateExecutor<R> {
    pub fn new(
        roster: RosterStore,
        targets: Arc<TargetTable>,
        renamer: Arc<R>,
        rename_timeout: Duration,
        counters: Counters,
    ) -> Self {
        Self {
            roster,
            targets,
            renamer,
            rename_timeout,
            updates: AtomicU64::new(0),
            counters,
        }
    }

    /// Number of executions dispatched so far.
    pub fn updates_dispatched(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }

    /// Runs one full update and reports what happened to each target.
    pub async fn execute(&self) -> UpdateReport {
        let update = self.updates.fetch_add(1, Ordering::SeqCst);
        Counters::bump(&self.counters.updates);

        async move {
            if !self.roster.is_connected() {
                debug!("roster not loaded yet; counting zero");
            }
            let metrics = self.roster.metrics();

            info!("[{update}] Updating counters…");
            info!(
                total = metrics.total,
                online = metrics.online,
                bots = metrics.bots,
                "{metrics}"
            );

            let outcomes =
                join_all(self.targets.iter().map(|t| self.update_target(t, &metrics))).await;

            UpdateReport {
                update,
                metrics,
                outcomes,
            }
        }
        .instrument(update_span(update))
        .await
    }

    async fn update_target(
        &self,
        target: &CounterTarget,
        metrics: &Metrics,
    ) -> (TargetKey, TargetOutcome) {
        let Some(handle) = target.handle() else {
            Counters::bump(&self.counters.targets_unresolved);
            warn!(
                counter = %target.key,
                "Tried to update {} count, but the reference to the channel is missing",
                target.label
            );
            return (target.key, TargetOutcome::Skipped);
        };

        let name = render_label(&target.label, metrics.get(target.field));

        let outcome = match self
            .rename(handle, &name)
            .instrument(rename_span(target.key.as_str(), &handle.id))
            .await
        {
            Ok(()) => {
                Counters::bump(&self.counters.renames_ok);
                debug!(counter = %target.key, %name, "counter renamed");
                TargetOutcome::Renamed
            }
            Err(e) => {
                Counters::bump(&self.counters.renames_failed);
                log_rename_failure(target, handle, &e);
                TargetOutcome::Failed(e.kind())
            }
        };

        (target.key, outcome)
    }

    /// One rename bounded by the per-call timeout; an elapsed call is
    /// reported as transient.
    async fn rename(&self, handle: &ChannelInfo, name: &str) -> Result<(), RenameError> {
        let call = tokio::time::timeout(self.rename_timeout, self.renamer.rename(&handle.id, name));

        match warn_if_slow("rename_channel", SLOW_RENAME, call).await {
            Ok(res) => res,
            Err(_) => Err(RenameError::Transient(format!(
                "timed out after {}ms",
                self.rename_timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl<R: ChannelRenamer> UpdateJob for UpdateExecutor<R> {
    async fn run(&self) {
        self.execute().await;
    }
}

fn log_rename_failure(target: &CounterTarget, handle: &ChannelInfo, err: &RenameError) {
    match err.kind() {
        RenameErrorKind::PermissionDenied => warn!(
            counter = %target.key,
            error = %err,
            "Bot does not have enough permissions to modify #{}",
            handle.name
        ),
        RenameErrorKind::NotFound => warn!(
            counter = %target.key,
            channel_id = %handle.id,
            "channel #{} no longer exists",
            handle.name
        ),
        RenameErrorKind::Transient => warn!(
            counter = %target.key,
            error = %err,
            "transient rename failure; next update retries"
        ),
        RenameErrorKind::Unknown => error!(
            counter = %target.key,
            error = %err,
            "unclassified rename failure"
        ),
    }
}
