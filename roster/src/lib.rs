//! Membership roster and the aggregate counts derived from it.

pub mod member;
pub mod metrics;
pub mod store;

pub use member::{Member, PresenceStatus};
pub use metrics::{MetricField, Metrics};
pub use store::RosterStore;
