use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::member::{Member, PresenceStatus};
use crate::metrics::Metrics;

/// Live roster of the observed community, keyed by user id.
///
/// `None` until the first full snapshot arrives; metrics read as zero until
/// then. Cloning shares the same roster.
#[derive(Clone, Default)]
pub struct RosterStore {
    inner: Arc<RwLock<Option<HashMap<String, Member>>>>,
}

impl RosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a full snapshot has been loaded.
    pub fn is_connected(&self) -> bool {
        self.inner.read().is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.read().as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the whole roster with a fresh snapshot.
    pub fn replace(&self, members: impl IntoIterator<Item = Member>) {
        let map: HashMap<_, _> = members
            .into_iter()
            .map(|m| (m.user_id.clone(), m))
            .collect();

        debug!(target: "roster", members = map.len(), "roster snapshot loaded");
        *self.inner.write() = Some(map);
    }

    /// Adds a batch of members on top of the current snapshot.
    ///
    /// Entries already known are overwritten.
    pub fn merge(&self, members: impl IntoIterator<Item = Member>) {
        let mut g = self.inner.write();
        let map = g.get_or_insert_with(HashMap::new);

        let mut added = 0usize;
        for m in members {
            map.insert(m.user_id.clone(), m);
            added += 1;
        }

        trace!(target: "roster", added, total = map.len(), "roster chunk merged");
    }

    /// Inserts a member, or refreshes its bot flag while keeping the last
    /// known presence.
    pub fn upsert_member(&self, user_id: &str, is_bot: bool) {
        let mut g = self.inner.write();
        let map = g.get_or_insert_with(HashMap::new);

        map.entry(user_id.to_string())
            .and_modify(|m| m.is_bot = is_bot)
            .or_insert_with(|| Member::new(user_id, is_bot, PresenceStatus::Offline));
    }

    pub fn remove_member(&self, user_id: &str) -> Option<Member> {
        self.inner.write().as_mut()?.remove(user_id)
    }

    /// Records a presence change. Unknown users are ignored: presence alone
    /// does not make someone a member.
    pub fn set_presence(&self, user_id: &str, status: PresenceStatus) -> bool {
        let mut g = self.inner.write();
        match g.as_mut().and_then(|map| map.get_mut(user_id)) {
            Some(m) => {
                m.status = status;
                true
            }
            None => false,
        }
    }

    /// Computes a fresh snapshot of the metrics.
    pub fn metrics(&self) -> Metrics {
        match self.inner.read().as_ref() {
            Some(map) => Metrics::from_members(map.values()),
            None => Metrics::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(id: &str, is_bot: bool, status: PresenceStatus) -> Member {
        Member::new(id, is_bot, status)
    }

    #[test]
    fn unconnected_roster_reports_zero() {
        let store = RosterStore::new();

        assert!(!store.is_connected());
        assert_eq!(store.metrics(), Metrics::default());
    }

    #[test]
    fn replace_then_presence_changes_are_reflected() {
        let store = RosterStore::new();
        store.replace([
            m("a", false, PresenceStatus::Offline),
            m("b", false, PresenceStatus::Online),
            m("bot", true, PresenceStatus::Online),
        ]);

        assert_eq!(store.metrics().online, 1);

        assert!(store.set_presence("a", PresenceStatus::Idle));
        assert_eq!(store.metrics().online, 2);

        assert!(!store.set_presence("ghost", PresenceStatus::Online));
        assert_eq!(store.metrics().total, 3);
    }

    #[test]
    fn upsert_keeps_known_presence() {
        let store = RosterStore::new();
        store.replace([m("a", false, PresenceStatus::Online)]);

        store.upsert_member("a", false);
        store.upsert_member("new", true);

        let metrics = store.metrics();
        assert_eq!(metrics.online, 1);
        assert_eq!(metrics.bots, 1);
        assert_eq!(metrics.total, 2);
    }

    #[test]
    fn remove_and_merge() {
        let store = RosterStore::new();
        store.replace([m("a", false, PresenceStatus::Online)]);
        store.merge([
            m("b", false, PresenceStatus::Offline),
            m("c", true, PresenceStatus::Offline),
        ]);

        assert_eq!(store.len(), 3);
        assert!(store.remove_member("a").is_some());
        assert!(store.remove_member("a").is_none());
        assert_eq!(
            store.metrics(),
            Metrics {
                total: 2,
                online: 0,
                bots: 1
            }
        );
    }

    #[test]
    fn replace_discards_previous_snapshot() {
        let store = RosterStore::new();
        store.replace([m("a", false, PresenceStatus::Online)]);
        store.replace([m("b", false, PresenceStatus::Offline)]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.metrics().online, 0);
    }
}
