use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::mpsc::Sender;
use tokio::time::{MissedTickBehavior, interval};
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, trace, warn};

use crate::discord::errors::GatewayError;
use crate::discord::events::{GatewayEvent, parse_dispatch};
use crate::discord::types::*;

const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Close codes after which the same identify payload can never succeed.
const FATAL_CLOSE_CODES: [u16; 6] = [4004, 4010, 4011, 4012, 4013, 4014];

/// Why a single gateway session ended without a fatal error.
enum SessionEnd {
    Reconnect,
    ReceiverGone,
}

/// Client for the Discord gateway WebSocket.
///
/// This client:
/// - identifies with the guild, member and presence intents
/// - keeps the session alive with heartbeats
/// - asks for the full member list once the observed guild is available
/// - forwards normalized `GatewayEvent`s into an mpsc channel
pub struct GatewayClient {
    url: String,
    token: String,
    guild_id: String,
}

impl GatewayClient {
    pub fn new(url: String, token: String, guild_id: String) -> Self {
        Self {
            url,
            token,
            guild_id,
        }
    }

    pub fn intents() -> u64 {
        INTENT_GUILDS | INTENT_GUILD_MEMBERS | INTENT_GUILD_PRESENCES
    }

    /// Main gateway loop.
    ///
    /// Reconnects after every recoverable session end. Returns `Ok(())` once
    /// the receiving side is dropped, or the fatal error that made
    /// reconnecting pointless.
    pub async fn run(&self, sender: Sender<GatewayEvent>) -> Result<(), GatewayError> {
        loop {
            info!(url = %self.url, "connecting to gateway");

            match connect_async(self.url.as_str()).await {
                Ok((ws, _)) => {
                    info!("gateway connected");
                    match self.session(ws, &sender).await {
                        Ok(SessionEnd::ReceiverGone) => return Ok(()),
                        Ok(SessionEnd::Reconnect) => info!("gateway asked to reconnect"),
                        Err(e @ GatewayError::Fatal { .. }) => {
                            error!(error = %e, "gateway session cannot be resumed");
                            return Err(e);
                        }
                        Err(e) => warn!(error = %e, "gateway session dropped"),
                    }
                }
                Err(e) => warn!(error = %e, "gateway connection failed"),
            }

            if sender.is_closed() {
                return Ok(());
            }

            debug!(delay_ms = RECONNECT_DELAY.as_millis() as u64, "reconnecting");
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn session<S>(&self, ws: S, sender: &Sender<GatewayEvent>) -> Result<SessionEnd, GatewayError>
    where
        S: futures::Stream<Item = Result<Message, tungstenite::Error>>
            + futures::Sink<Message, Error = tungstenite::Error>
            + Unpin,
    {
        let (mut write, mut read) = ws.split();

        let hello = Self::await_hello(&mut read).await?;
        debug!(interval_ms = hello.heartbeat_interval, "gateway hello");

        let mut heartbeat = interval(Duration::from_millis(hello.heartbeat_interval.max(1)));
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; identify first.
        heartbeat.tick().await;

        Self::send(&mut write, self.identify()).await?;

        let mut seq: Option<u64> = None;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    trace!(?seq, "heartbeat");
                    Self::send(&mut write, heartbeat_payload(seq)).await?;
                }
                msg = read.next() => {
                    let Some(msg) = msg else {
                        return Ok(SessionEnd::Reconnect);
                    };

                    match msg? {
                        Message::Text(text) => {
                            let payload: GatewayPayload = serde_json::from_str(text.as_str())?;
                            if payload.s.is_some() {
                                seq = payload.s;
                            }

                            match payload.op {
                                OP_DISPATCH => {
                                    let Some(kind) = payload.t else { continue };
                                    let event = match parse_dispatch(&kind, payload.d) {
                                        Ok(Some(ev)) => ev,
                                        Ok(None) => continue,
                                        Err(e) => {
                                            warn!(%kind, error = %e, "undecodable dispatch skipped");
                                            continue;
                                        }
                                    };

                                    if let GatewayEvent::GuildAvailable { guild_id, .. } = &event {
                                        if *guild_id == self.guild_id {
                                            Self::send(&mut write, request_members_payload(guild_id)).await?;
                                        }
                                    }

                                    if sender.send(event).await.is_err() {
                                        return Ok(SessionEnd::ReceiverGone);
                                    }
                                }
                                OP_HEARTBEAT => {
                                    Self::send(&mut write, heartbeat_payload(seq)).await?;
                                }
                                OP_HEARTBEAT_ACK => trace!("heartbeat ack"),
                                OP_RECONNECT | OP_INVALID_SESSION => {
                                    return Ok(SessionEnd::Reconnect);
                                }
                                op => debug!(op, "unhandled gateway opcode"),
                            }
                        }
                        Message::Close(frame) => {
                            if let Some(frame) = frame {
                                let code = u16::from(frame.code);
                                if FATAL_CLOSE_CODES.contains(&code) {
                                    return Err(GatewayError::Fatal {
                                        code,
                                        reason: frame.reason.as_str().to_string(),
                                    });
                                }
                                info!(code, reason = %frame.reason.as_str(), "gateway closed the session");
                            }
                            return Ok(SessionEnd::Reconnect);
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    async fn await_hello<R>(read: &mut R) -> Result<Hello, GatewayError>
    where
        R: futures::Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        while let Some(msg) = read.next().await {
            if let Message::Text(text) = msg? {
                let payload: GatewayPayload = serde_json::from_str(text.as_str())?;
                if payload.op != OP_HELLO {
                    return Err(GatewayError::Protocol(format!(
                        "expected hello, got op {}",
                        payload.op
                    )));
                }
                return Ok(serde_json::from_value(payload.d)?);
            }
        }

        Err(GatewayError::Protocol("stream ended before hello".into()))
    }

    async fn send<W>(write: &mut W, payload: Value) -> Result<(), GatewayError>
    where
        W: futures::Sink<Message, Error = tungstenite::Error> + Unpin,
    {
        write.send(Message::Text(payload.to_string().into())).await?;
        Ok(())
    }

    fn identify(&self) -> Value {
        json!({
            "op": OP_IDENTIFY,
            "d": {
                "token": self.token,
                "intents": Self::intents(),
                "properties": {
                    "os": std::env::consts::OS,
                    "browser": "counterbot",
                    "device": "counterbot"
                }
            }
        })
    }
}

fn heartbeat_payload(seq: Option<u64>) -> Value {
    json!({ "op": OP_HEARTBEAT, "d": seq })
}

/// Full member list with presences; answered by GUILD_MEMBERS_CHUNK dispatches.
fn request_members_payload(guild_id: &str) -> Value {
    json!({
        "op": OP_REQUEST_GUILD_MEMBERS,
        "d": {
            "guild_id": guild_id,
            "query": "",
            "limit": 0,
            "presences": true
        }
    })
}
