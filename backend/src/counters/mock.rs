//! In-memory `ChannelRenamer` shared by unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use roster::MetricField;

use crate::counters::rename::{ChannelRenamer, RenameError};
use crate::counters::target::{ChannelInfo, CounterTarget, TargetKey, TargetTable};

/// Records every call; fails ids listed in `failures`.
#[derive(Default)]
pub struct MockRenamer {
    pub calls: Mutex<Vec<(String, String)>>,
    pub failures: HashMap<String, RenameError>,
    pub delay: Option<Duration>,
}

impl MockRenamer {
    pub fn failing(id: &str, err: RenameError) -> Self {
        Self {
            failures: HashMap::from([(id.to_string(), err)]),
            ..Default::default()
        }
    }

    /// Calls sorted by channel id; concurrent renames have no fixed order.
    pub fn calls(&self) -> Vec<(String, String)> {
        let mut calls = self.calls.lock().clone();
        calls.sort();
        calls
    }
}

#[async_trait]
impl ChannelRenamer for MockRenamer {
    async fn rename(&self, channel_id: &str, name: &str) -> Result<(), RenameError> {
        self.calls
            .lock()
            .push((channel_id.to_string(), name.to_string()));
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        match self.failures.get(channel_id) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

/// Members/Online/Bots bound to ids "1"/"2"/"3"; only `resolved` ids get a
/// live channel named `chan-<id>`.
pub fn resolved_targets(resolved: &[&str]) -> Arc<TargetTable> {
    let table = TargetTable::new(vec![
        CounterTarget::new(TargetKey::TotalCount, "1", "Members", MetricField::Total),
        CounterTarget::new(TargetKey::OnlineCount, "2", "Online", MetricField::Online),
        CounterTarget::new(TargetKey::BotCount, "3", "Bots", MetricField::Bots),
    ]);
    let channels: Vec<_> = resolved
        .iter()
        .map(|id| ChannelInfo::new(*id, format!("chan-{id}")))
        .collect();
    table.resolve(&channels);
    Arc::new(table)
}
