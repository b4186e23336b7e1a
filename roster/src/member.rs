use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Presence reported for one member.
///
/// `invisible` and any status this build does not know are folded into
/// `Offline`, so they never count as online.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum PresenceStatus {
    Online,
    Idle,
    DoNotDisturb,
    #[default]
    Offline,
}

impl PresenceStatus {
    pub fn is_offline(&self) -> bool {
        matches!(self, PresenceStatus::Offline)
    }

    pub fn from_wire(s: &str) -> Self {
        match s {
            "online" => PresenceStatus::Online,
            "idle" => PresenceStatus::Idle,
            "dnd" => PresenceStatus::DoNotDisturb,
            _ => PresenceStatus::Offline,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceStatus::Online => "online",
            PresenceStatus::Idle => "idle",
            PresenceStatus::DoNotDisturb => "dnd",
            PresenceStatus::Offline => "offline",
        }
    }
}

impl FromStr for PresenceStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_wire(s))
    }
}

impl From<String> for PresenceStatus {
    fn from(s: String) -> Self {
        Self::from_wire(&s)
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: String,
    pub is_bot: bool,
    pub status: PresenceStatus,
}

impl Member {
    pub fn new(user_id: impl Into<String>, is_bot: bool, status: PresenceStatus) -> Self {
        Self {
            user_id: user_id.into(),
            is_bot,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_statuses() {
        assert_eq!("online".parse::<PresenceStatus>(), Ok(PresenceStatus::Online));
        assert_eq!("idle".parse::<PresenceStatus>(), Ok(PresenceStatus::Idle));
        assert_eq!("dnd".parse::<PresenceStatus>(), Ok(PresenceStatus::DoNotDisturb));
        assert_eq!("offline".parse::<PresenceStatus>(), Ok(PresenceStatus::Offline));
    }

    #[test]
    fn invisible_and_unknown_count_as_offline() {
        assert!("invisible".parse::<PresenceStatus>().unwrap().is_offline());
        assert!("streaming".parse::<PresenceStatus>().unwrap().is_offline());
    }

    #[test]
    fn deserializes_from_json_string() {
        let s: PresenceStatus = serde_json::from_str("\"dnd\"").unwrap();
        assert_eq!(s, PresenceStatus::DoNotDisturb);
    }
}
