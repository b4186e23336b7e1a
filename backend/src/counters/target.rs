//! Counter targets: one displayable channel bound to one metric field.
//!
//! Handles are bound at most once per target, the first time a live channel
//! with the configured id is seen. Later resolutions (e.g. after a gateway
//! reconnect) never rebind, so readers need no lock.

use std::fmt;

use once_cell::sync::OnceCell;
use roster::MetricField;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, ChannelConfig};

/// Value rendered into every label on shutdown.
pub const OFF_VALUE: &str = "Off";

/// `"{label} : {value}"`.
pub fn render_label(label: &str, value: impl fmt::Display) -> String {
    format!("{label} : {value}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKey {
    TotalCount,
    OnlineCount,
    BotCount,
}

impl TargetKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKey::TotalCount => "totalCount",
            TargetKey::OnlineCount => "onlineCount",
            TargetKey::BotCount => "botCount",
        }
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live channel as reported by the community.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
}

impl ChannelInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug)]
pub struct CounterTarget {
    pub key: TargetKey,
    pub external_id: String,
    pub label: String,
    pub field: MetricField,
    handle: OnceCell<ChannelInfo>,
}

impl CounterTarget {
    pub fn new(
        key: TargetKey,
        external_id: impl Into<String>,
        label: impl Into<String>,
        field: MetricField,
    ) -> Self {
        Self {
            key,
            external_id: external_id.into(),
            label: label.into(),
            field,
            handle: OnceCell::new(),
        }
    }

    fn from_channel_config(key: TargetKey, cfg: &ChannelConfig, field: MetricField) -> Self {
        Self::new(key, cfg.id.clone(), cfg.name.clone(), field)
    }

    /// Live channel bound to this target, if resolution found one.
    pub fn handle(&self) -> Option<&ChannelInfo> {
        self.handle.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Binds `channel` if its id matches and nothing is bound yet.
    fn bind(&self, channel: &ChannelInfo) -> bool {
        if self.external_id.is_empty() || channel.id != self.external_id {
            return false;
        }
        self.handle.set(channel.clone()).is_ok()
    }
}

/// The fixed set of counters, in display order.
#[derive(Debug)]
pub struct TargetTable {
    targets: Vec<CounterTarget>,
}

impl TargetTable {
    pub fn new(targets: Vec<CounterTarget>) -> Self {
        Self { targets }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        let table = Self::new(vec![
            CounterTarget::from_channel_config(
                TargetKey::TotalCount,
                &cfg.total_channel,
                MetricField::Total,
            ),
            CounterTarget::from_channel_config(
                TargetKey::OnlineCount,
                &cfg.online_channel,
                MetricField::Online,
            ),
            CounterTarget::from_channel_config(
                TargetKey::BotCount,
                &cfg.bot_channel,
                MetricField::Bots,
            ),
        ]);

        for t in table.iter().filter(|t| t.external_id.is_empty()) {
            warn!(counter = %t.key, "no channel id configured; counter will be skipped");
        }

        table
    }

    pub fn iter(&self) -> impl Iterator<Item = &CounterTarget> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn resolved_count(&self) -> usize {
        self.targets.iter().filter(|t| t.is_resolved()).count()
    }

    /// Binds targets to the live channels of the community.
    ///
    /// Prints the channel listing so operators can find the ids to put into
    /// the config. Returns the number of targets bound by this call.
    pub fn resolve(&self, channels: &[ChannelInfo]) -> usize {
        let mut bound = 0;

        info!(channels = channels.len(), "available channels:");
        for (i, channel) in channels.iter().enumerate() {
            debug!("    [{i}] {}, id - {}", channel.name, channel.id);

            for target in &self.targets {
                if target.bind(channel) {
                    info!(counter = %target.key, "Reference found for {}", target.label);
                    bound += 1;
                }
            }
        }

        for target in self.targets.iter().filter(|t| !t.is_resolved()) {
            warn!(
                counter = %target.key,
                channel_id = %target.external_id,
                "no channel matches the configured id; counter stays unresolved"
            );
        }

        bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TargetTable {
        TargetTable::new(vec![
            CounterTarget::new(TargetKey::TotalCount, "1", "Members", MetricField::Total),
            CounterTarget::new(TargetKey::OnlineCount, "2", "Online", MetricField::Online),
            CounterTarget::new(TargetKey::BotCount, "", "Bots", MetricField::Bots),
        ])
    }

    #[test]
    fn label_format() {
        assert_eq!(render_label("Members", 42), "Members : 42");
        assert_eq!(render_label("Members", OFF_VALUE), "Members : Off");
    }

    #[test]
    fn resolve_binds_matching_ids_only() {
        let t = table();
        let channels = vec![
            ChannelInfo::new("1", "members-42"),
            ChannelInfo::new("9", "general"),
            ChannelInfo::new("", "weird"),
        ];

        assert_eq!(t.resolve(&channels), 1);
        assert_eq!(t.resolved_count(), 1);

        let total = t.iter().next().unwrap();
        assert_eq!(total.handle().unwrap().name, "members-42");
    }

    #[test]
    fn resolution_never_rebinds() {
        let t = table();
        t.resolve(&[ChannelInfo::new("1", "first")]);

        assert_eq!(t.resolve(&[ChannelInfo::new("1", "second")]), 0);

        let total = t.iter().next().unwrap();
        assert_eq!(total.handle().unwrap().name, "first");
    }
}
