use std::path::Path;
use std::time::Duration;

use scheduler::SchedulerConfig;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";
pub const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

const DEFAULT_COOLDOWN_SECS: f64 = 10.0;
const DEFAULT_RENAME_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// One counter channel as written in the config file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ChannelConfig {
    /// Channel id the counter is bound to.
    #[serde(default)]
    pub id: String,
    /// Label shown before the value, e.g. `"Members"` -> `"Members : 42"`.
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Bot token used for both the gateway and the REST API.
    pub token: String,

    /// Id of the observed server (guild).
    pub server: String,

    // =========================
    // Scheduler configuration
    // =========================
    /// Coalescing window between counter updates.
    ///
    /// Channel renames are heavily rate limited upstream, so presence storms
    /// must collapse into at most one leading and one trailing update per
    /// window. Zero disables debouncing.
    pub scheduler: SchedulerConfig,

    // =========================
    // Counter channels
    // =========================
    pub total_channel: ChannelConfig,
    pub online_channel: ChannelConfig,
    pub bot_channel: ChannelConfig,

    // =========================
    // Remote calls
    // =========================
    /// Upper bound for a single rename call. An elapsed call is treated as a
    /// transient failure; the next update retries naturally.
    pub rename_timeout: Duration,

    /// Upper bound for the whole "Off" pass on shutdown.
    pub shutdown_timeout: Duration,

    pub api_base: String,
    pub gateway_url: String,
}

/// File representation; every field optional so validation can report all
/// gaps at once. Durations are kept as raw JSON and judged in `validate`:
/// a malformed value never rejects the whole file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    token: Option<String>,
    server: Option<String>,
    cooldown_seconds: Option<Value>,
    /// Legacy key; `cooldownSeconds` wins when both are set.
    cooldown: Option<Value>,
    #[serde(default)]
    total_channel: ChannelConfig,
    #[serde(default)]
    online_channel: ChannelConfig,
    #[serde(default)]
    bot_channel: ChannelConfig,
    rename_timeout_seconds: Option<Value>,
    shutdown_timeout_seconds: Option<Value>,
    api_base: Option<String>,
    gateway_url: Option<String>,
}

impl AppConfig {
    /// Loads the config file named by `COUNTERBOT_CONFIG` (default
    /// `config.json`). `DISCORD_TOKEN` overrides the file's token.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var("COUNTERBOT_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let token = std::env::var("DISCORD_TOKEN").ok();

        Self::load(path, token)
    }

    pub fn load(path: impl AsRef<Path>, token_override: Option<String>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_json_str(&text, token_override)
    }

    pub fn from_json_str(text: &str, token_override: Option<String>) -> Result<Self, ConfigError> {
        let mut raw: RawConfig = serde_json::from_str(text)?;
        if let Some(token) = token_override.filter(|t| !t.trim().is_empty()) {
            raw.token = Some(token);
        }

        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        let token = non_empty(raw.token);
        let server = non_empty(raw.server);

        let mut missing = Vec::new();
        if token.is_none() {
            missing.push("token");
        }
        if server.is_none() {
            missing.push("server");
        }

        let (Some(token), Some(server)) = (token, server) else {
            return Err(ConfigError::MissingFields(missing));
        };

        Ok(Self {
            token,
            server,
            scheduler: SchedulerConfig::from_secs_f64(
                raw.cooldown_seconds
                    .or(raw.cooldown)
                    .map_or(DEFAULT_COOLDOWN_SECS, |v| lenient_secs(&v)),
            ),
            total_channel: raw.total_channel,
            online_channel: raw.online_channel,
            bot_channel: raw.bot_channel,
            rename_timeout: positive_secs(
                raw.rename_timeout_seconds.as_ref(),
                DEFAULT_RENAME_TIMEOUT,
            ),
            shutdown_timeout: positive_secs(
                raw.shutdown_timeout_seconds.as_ref(),
                DEFAULT_SHUTDOWN_TIMEOUT,
            ),
            api_base: non_empty(raw.api_base).unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            gateway_url: non_empty(raw.gateway_url)
                .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string()),
        })
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Seconds out of a JSON number or numeric string; anything else is NaN,
/// which every caller treats as invalid.
fn lenient_secs(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn positive_secs(v: Option<&Value>, default: Duration) -> Duration {
    v.map(lenient_secs)
        .filter(|s| *s > 0.0)
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
        .filter(|d| !d.is_zero())
        .unwrap_or(default)
}
