use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use crate::counters::rename::{ChannelRenamer, RenameError};
use crate::discord::errors::DiscordError;
use crate::discord::types::ApiErrorBody;

/// API codes meaning "the bot may not touch this channel".
const CODE_MISSING_ACCESS: u32 = 50001;
const CODE_MISSING_PERMISSIONS: u32 = 50013;
const CODE_UNKNOWN_CHANNEL: u32 = 10003;

#[derive(Clone)]
pub struct DiscordClient {
    http: Client,
    api_base: String,
}

impl DiscordClient {
    pub fn new(api_base: String, token: &str, timeout: Duration) -> Result<Self, DiscordError> {
        let mut auth = HeaderValue::from_str(&format!("Bot {token}"))
            .map_err(|_| DiscordError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    #[instrument(
        skip(self, name),
        fields(channel_id = %channel_id),
        level = "debug"
    )]
    pub async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<(), RenameError> {
        let url = format!("{}/channels/{}", self.api_base, channel_id);

        let resp = self
            .http
            .patch(&url)
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .map_err(classify_transport)?;

        let status = resp.status();
        if status.is_success() {
            debug!(%status, "channel renamed");
            return Ok(());
        }

        let body = resp.json::<ApiErrorBody>().await.unwrap_or_default();
        Err(classify_failure(status, &body))
    }
}

#[async_trait]
impl ChannelRenamer for DiscordClient {
    async fn rename(&self, channel_id: &str, name: &str) -> Result<(), RenameError> {
        self.rename_channel(channel_id, name).await
    }
}

/// Normalizes an HTTP error response into a rename error kind.
pub fn classify_failure(status: StatusCode, body: &ApiErrorBody) -> RenameError {
    match body.code {
        Some(code @ (CODE_MISSING_ACCESS | CODE_MISSING_PERMISSIONS)) => {
            return RenameError::PermissionDenied { code: Some(code) };
        }
        Some(CODE_UNKNOWN_CHANNEL) => return RenameError::NotFound,
        _ => {}
    }

    match status {
        StatusCode::FORBIDDEN => RenameError::PermissionDenied { code: body.code },
        StatusCode::NOT_FOUND => RenameError::NotFound,
        StatusCode::TOO_MANY_REQUESTS => {
            RenameError::Transient(format!("rate limited: {}", body.message))
        }
        s if s.is_server_error() => RenameError::Transient(format!("{s}: {}", body.message)),
        s => RenameError::Unknown(format!("{s}: {}", body.message)),
    }
}

fn classify_transport(e: reqwest::Error) -> RenameError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        RenameError::Transient(e.to_string())
    } else {
        RenameError::Unknown(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(code: Option<u32>) -> ApiErrorBody {
        ApiErrorBody {
            code,
            message: "msg".into(),
        }
    }

    #[test]
    fn permission_codes_win_over_status() {
        let e = classify_failure(StatusCode::BAD_REQUEST, &body(Some(50013)));
        assert_eq!(e, RenameError::PermissionDenied { code: Some(50013) });

        let e = classify_failure(StatusCode::FORBIDDEN, &body(Some(50001)));
        assert_eq!(e, RenameError::PermissionDenied { code: Some(50001) });
    }

    #[test]
    fn forbidden_without_code_is_permission_denied() {
        let e = classify_failure(StatusCode::FORBIDDEN, &ApiErrorBody::default());
        assert_eq!(e, RenameError::PermissionDenied { code: None });
    }

    #[test]
    fn unknown_channel_is_not_found() {
        assert_eq!(
            classify_failure(StatusCode::NOT_FOUND, &body(Some(10003))),
            RenameError::NotFound
        );
        assert_eq!(
            classify_failure(StatusCode::NOT_FOUND, &body(None)),
            RenameError::NotFound
        );
    }

    #[test]
    fn rate_limits_and_server_errors_are_transient() {
        let e = classify_failure(StatusCode::TOO_MANY_REQUESTS, &body(None));
        assert!(matches!(e, RenameError::Transient(_)));

        let e = classify_failure(StatusCode::BAD_GATEWAY, &body(None));
        assert!(matches!(e, RenameError::Transient(_)));
    }

    #[test]
    fn everything_else_is_unknown() {
        let e = classify_failure(StatusCode::BAD_REQUEST, &body(Some(50035)));
        assert!(matches!(e, RenameError::Unknown(_)));
    }

    #[test]
    fn rejects_token_with_control_characters() {
        let res = DiscordClient::new("http://x".into(), "bad\ntoken", Duration::from_secs(1));
        assert!(matches!(res, Err(DiscordError::InvalidToken)));
    }
}
