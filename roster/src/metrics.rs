use std::fmt;

use crate::member::Member;

/// Aggregate counts over one roster snapshot.
///
/// Always recomputed wholesale; never patched from individual events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub total: u64,
    /// Non-bot members whose presence is anything but offline.
    pub online: u64,
    pub bots: u64,
}

impl Metrics {
    /// Counts all three fields in a single pass.
    pub fn from_members<'a, I>(members: I) -> Self
    where
        I: IntoIterator<Item = &'a Member>,
    {
        let mut m = Metrics::default();

        for member in members {
            m.total += 1;
            if member.is_bot {
                m.bots += 1;
            } else if !member.status.is_offline() {
                m.online += 1;
            }
        }

        m
    }

    pub fn get(&self, field: MetricField) -> u64 {
        match field {
            MetricField::Total => self.total,
            MetricField::Online => self.online,
            MetricField::Bots => self.bots,
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total members - {}, Online users - {}, Bots - {}",
            self.total, self.online, self.bots
        )
    }
}

/// Which metric a counter displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricField {
    Total,
    Online,
    Bots,
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MetricField::Total => "total",
            MetricField::Online => "online",
            MetricField::Bots => "bots",
        };
        f.write_str(s)
    }
}
