use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Error, Debug)]
pub enum DiscordError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid bot token header")]
    InvalidToken,
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("websocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("invalid gateway payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("gateway protocol violation: {0}")]
    Protocol(String),

    /// Close codes after which reconnecting cannot help (bad token,
    /// disallowed intents, ...).
    #[error("gateway closed the session with fatal code {code}: {reason}")]
    Fatal { code: u16, reason: String },
}
