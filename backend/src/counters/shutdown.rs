use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::counters::rename::ChannelRenamer;
use crate::counters::target::{OFF_VALUE, TargetTable, render_label};

/// Final best-effort pass: every resolved counter reads `"{label} : Off"`.
///
/// Runs directly, outside the scheduler. Failures are ignored and the whole
/// pass is bounded by `limit` so a hung remote call cannot block exit.
/// Returns the number of renames attempted.
pub async fn shutdown_flush<R: ChannelRenamer + ?Sized>(
    targets: &TargetTable,
    renamer: &R,
    limit: Duration,
) -> usize {
    let calls: Vec<_> = targets
        .iter()
        .filter_map(|t| t.handle().map(|h| (t, h)))
        .map(|(target, handle)| async move {
            let name = render_label(&target.label, OFF_VALUE);
            if let Err(e) = renamer.rename(&handle.id, &name).await {
                debug!(counter = %target.key, error = %e, "ignored rename failure during shutdown");
            }
        })
        .collect();

    let attempted = calls.len();
    info!(counters = attempted, "setting counters to Off");

    if tokio::time::timeout(limit, join_all(calls)).await.is_err() {
        warn!(
            limit_ms = limit.as_millis() as u64,
            "shutdown flush timed out; exiting anyway"
        );
    }

    attempted
}
