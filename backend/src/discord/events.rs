//! Gateway dispatches normalized into the roster events the app reacts to.

use std::collections::HashMap;

use roster::{Member, PresenceStatus};
use serde_json::Value;

use crate::counters::target::ChannelInfo;
use crate::discord::types::{
    GuildCreate, GuildMember, GuildMemberEvent, GuildMembersChunk, Presence, Ready,
};

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// Session established; lists the guilds the bot belongs to.
    Ready { user: String, guild_ids: Vec<String> },
    /// Full guild snapshot: connection-ready for that guild.
    GuildAvailable {
        guild_id: String,
        name: String,
        members: Vec<Member>,
        channels: Vec<ChannelInfo>,
    },
    /// A chunk of members answering a member-list request.
    MembersAvailable {
        guild_id: String,
        members: Vec<Member>,
    },
    MemberAdded {
        guild_id: String,
        member: Member,
    },
    MemberRemoved {
        guild_id: String,
        user_id: String,
    },
    MemberUpdated {
        guild_id: String,
        user_id: String,
        is_bot: bool,
    },
    PresenceUpdated {
        guild_id: String,
        user_id: String,
        status: PresenceStatus,
    },
}

impl GatewayEvent {
    /// Guild the event belongs to; `None` for session-level events.
    pub fn guild_id(&self) -> Option<&str> {
        match self {
            GatewayEvent::Ready { .. } => None,
            GatewayEvent::GuildAvailable { guild_id, .. }
            | GatewayEvent::MembersAvailable { guild_id, .. }
            | GatewayEvent::MemberAdded { guild_id, .. }
            | GatewayEvent::MemberRemoved { guild_id, .. }
            | GatewayEvent::MemberUpdated { guild_id, .. }
            | GatewayEvent::PresenceUpdated { guild_id, .. } => Some(guild_id),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GatewayEvent::Ready { .. } => "ready",
            GatewayEvent::GuildAvailable { .. } => "guild_available",
            GatewayEvent::MembersAvailable { .. } => "members_available",
            GatewayEvent::MemberAdded { .. } => "member_added",
            GatewayEvent::MemberRemoved { .. } => "member_removed",
            GatewayEvent::MemberUpdated { .. } => "member_updated",
            GatewayEvent::PresenceUpdated { .. } => "presence_updated",
        }
    }
}

/// Maps one dispatch (`t`, `d`) to an event. Dispatch types we do not
/// consume, and guilds that are still unavailable, yield `Ok(None)`.
pub fn parse_dispatch(kind: &str, data: Value) -> Result<Option<GatewayEvent>, serde_json::Error> {
    let event = match kind {
        "READY" => {
            let ready: Ready = serde_json::from_value(data)?;
            GatewayEvent::Ready {
                user: ready.user.username.unwrap_or(ready.user.id),
                guild_ids: ready.guilds.into_iter().map(|g| g.id).collect(),
            }
        }
        "GUILD_CREATE" => {
            let guild: GuildCreate = serde_json::from_value(data)?;
            if guild.unavailable {
                return Ok(None);
            }
            GatewayEvent::GuildAvailable {
                guild_id: guild.id,
                name: guild.name,
                members: join_presences(guild.members, guild.presences),
                channels: guild
                    .channels
                    .into_iter()
                    .map(|c| ChannelInfo::new(c.id, c.name.unwrap_or_default()))
                    .collect(),
            }
        }
        "GUILD_MEMBERS_CHUNK" => {
            let chunk: GuildMembersChunk = serde_json::from_value(data)?;
            GatewayEvent::MembersAvailable {
                guild_id: chunk.guild_id,
                members: join_presences(chunk.members, chunk.presences),
            }
        }
        "GUILD_MEMBER_ADD" => {
            let ev: GuildMemberEvent = serde_json::from_value(data)?;
            GatewayEvent::MemberAdded {
                guild_id: ev.guild_id,
                member: Member::new(ev.user.id, ev.user.bot, PresenceStatus::Offline),
            }
        }
        "GUILD_MEMBER_REMOVE" => {
            let ev: GuildMemberEvent = serde_json::from_value(data)?;
            GatewayEvent::MemberRemoved {
                guild_id: ev.guild_id,
                user_id: ev.user.id,
            }
        }
        "GUILD_MEMBER_UPDATE" => {
            let ev: GuildMemberEvent = serde_json::from_value(data)?;
            GatewayEvent::MemberUpdated {
                guild_id: ev.guild_id,
                user_id: ev.user.id,
                is_bot: ev.user.bot,
            }
        }
        "PRESENCE_UPDATE" => {
            let p: Presence = serde_json::from_value(data)?;
            let Some(guild_id) = p.guild_id else {
                return Ok(None);
            };
            GatewayEvent::PresenceUpdated {
                guild_id,
                user_id: p.user.id,
                status: p.status,
            }
        }
        _ => return Ok(None),
    };

    Ok(Some(event))
}

/// Members absent from `presences` are offline.
fn join_presences(members: Vec<GuildMember>, presences: Vec<Presence>) -> Vec<Member> {
    let status: HashMap<String, PresenceStatus> = presences
        .into_iter()
        .map(|p| (p.user.id, p.status))
        .collect();

    members
        .into_iter()
        .filter_map(|m| m.user)
        .map(|u| {
            let s = status.get(&u.id).copied().unwrap_or_default();
            Member::new(u.id, u.bot, s)
        })
        .collect()
}
