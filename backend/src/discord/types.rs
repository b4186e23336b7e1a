//! Wire types for the parts of the gateway and REST API we consume.

use roster::PresenceStatus;
use serde::Deserialize;
use serde_json::Value;

pub const OP_DISPATCH: u8 = 0;
pub const OP_HEARTBEAT: u8 = 1;
pub const OP_IDENTIFY: u8 = 2;
pub const OP_RECONNECT: u8 = 7;
pub const OP_REQUEST_GUILD_MEMBERS: u8 = 8;
pub const OP_INVALID_SESSION: u8 = 9;
pub const OP_HELLO: u8 = 10;
pub const OP_HEARTBEAT_ACK: u8 = 11;

pub const INTENT_GUILDS: u64 = 1 << 0;
pub const INTENT_GUILD_MEMBERS: u64 = 1 << 1;
pub const INTENT_GUILD_PRESENCES: u64 = 1 << 8;

/// Envelope of every gateway frame.
#[derive(Debug, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    pub s: Option<u64>,
    pub t: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Hello {
    pub heartbeat_interval: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Deserialize)]
pub struct PartialUser {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct UnavailableGuild {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct Ready {
    pub user: User,
    #[serde(default)]
    pub guilds: Vec<UnavailableGuild>,
}

#[derive(Debug, Deserialize)]
pub struct GuildMember {
    pub user: Option<User>,
}

#[derive(Debug, Deserialize)]
pub struct Presence {
    pub user: PartialUser,
    #[serde(default)]
    pub status: PresenceStatus,
    pub guild_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GuildCreate {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub members: Vec<GuildMember>,
    #[serde(default)]
    pub presences: Vec<Presence>,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// Shared shape of GUILD_MEMBER_ADD / _UPDATE / _REMOVE.
#[derive(Debug, Deserialize)]
pub struct GuildMemberEvent {
    pub guild_id: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct GuildMembersChunk {
    pub guild_id: String,
    #[serde(default)]
    pub members: Vec<GuildMember>,
    #[serde(default)]
    pub presences: Vec<Presence>,
}

/// Error body returned by the REST API.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    pub code: Option<u32>,
    #[serde(default)]
    pub message: String,
}
