use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("missing required config fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("bot is not added to server id {0}")]
    GuildNotJoined(String),

    #[error("gateway event stream closed")]
    EventsClosed,
}
