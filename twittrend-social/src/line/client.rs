use super::types::PushRequest;
use crate::Notifier;
use async_trait::async_trait;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;
use twittrend_common::{Result, TrendError};
use twittrend_http::{Auth, HttpClient, HttpError, RequestOpts};

pub const DEFAULT_PUSH_ENDPOINT: &str = "https://api.line.me/v2/bot/message/push";

const TOKEN_KEY: &str = "LINE_CHANNEL_ACCESS_TOKEN";
const GROUP_KEY: &str = "LINE_GROUP_ID";

fn destination_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Group (C), user (U) or room (R) id.
    RE.get_or_init(|| Regex::new(r"^[CUR][0-9a-fA-F]{32}$").expect("destination pattern is valid"))
}

/// Channel access token plus destination id, both validated.
#[derive(Clone)]
pub struct LineCredentials {
    token: String,
    group_id: String,
}

impl LineCredentials {
    /// Validate raw values as read from config/env. Missing or malformed
    /// values are a [`TrendError::Config`] naming the variable.
    pub fn new(token: Option<&str>, group_id: Option<&str>) -> Result<Self> {
        let token = token.map(str::trim).unwrap_or_default();
        if token.is_empty() {
            return Err(TrendError::config(TOKEN_KEY, "missing channel access token"));
        }
        if !token.is_ascii() || token.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TrendError::config(
                TOKEN_KEY,
                "token must be ASCII without whitespace or control characters",
            ));
        }

        let group_id = group_id.map(str::trim).unwrap_or_default();
        if group_id.is_empty() {
            return Err(TrendError::config(GROUP_KEY, "missing destination id"));
        }
        if !destination_re().is_match(group_id) {
            return Err(TrendError::config(
                GROUP_KEY,
                format!("{group_id:?} is not a LINE destination id (C/U/R + 32 hex digits)"),
            ));
        }

        Ok(Self {
            token: token.to_string(),
            group_id: group_id.to_string(),
        })
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }
}

impl fmt::Debug for LineCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineCredentials")
            .field("token", &"<redacted>")
            .field("group_id", &self.group_id)
            .finish()
    }
}

/// Pushes text messages to one LINE destination.
#[derive(Clone)]
pub struct LinePushClient {
    http: HttpClient,
    credentials: LineCredentials,
}

impl LinePushClient {
    pub fn new(endpoint: &str, credentials: LineCredentials) -> Result<Self> {
        let http = HttpClient::new(endpoint)
            .map_err(|e| TrendError::config("line.endpoint", e.to_string()))?;
        Ok(Self { http, credentials })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    pub fn credentials(&self) -> &LineCredentials {
        &self.credentials
    }

    /// Deliver `text` as a single bubble. Only HTTP 200 counts as success.
    pub async fn push_text(&self, text: &str) -> Result<()> {
        let body = PushRequest::single_text(&self.credentials.group_id, text);
        let resp = self
            .http
            .post_json_raw(
                "",
                &body,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.credentials.token)),
                    ..Default::default()
                },
            )
            .await
            .map_err(delivery_error)?;

        if resp.status.as_u16() != 200 {
            let message = resp.error_message();
            tracing::error!(
                status = %resp.status,
                request_id = %resp.request_id,
                %message,
                "line.push.rejected"
            );
            return Err(TrendError::Delivery {
                status: Some(resp.status.as_u16()),
                message,
                body: resp.body,
            });
        }

        tracing::info!(
            request_id = %resp.request_id,
            chars = text.chars().count(),
            "line.push.ok"
        );
        Ok(())
    }
}

#[async_trait]
impl Notifier for LinePushClient {
    fn name(&self) -> &str {
        "line"
    }

    async fn notify(&self, message: &str) -> Result<()> {
        self.push_text(message).await
    }
}

fn delivery_error(err: HttpError) -> TrendError {
    tracing::error!(error = %err, "line.push.failed");
    TrendError::Delivery {
        status: err.status().map(|s| s.as_u16()),
        message: err.to_string(),
        body: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twittrend_common::ErrorKind;

    const GROUP: &str = "C0123456789abcdef0123456789abcdef";

    fn config_key(err: TrendError) -> String {
        match err {
            TrendError::Config { key, .. } => key,
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_well_formed_credentials() {
        let creds = LineCredentials::new(Some(" tok/en+= "), Some(GROUP)).unwrap();
        assert_eq!(creds.group_id(), GROUP);
        assert_eq!(creds.token, "tok/en+=");
    }

    #[test]
    fn missing_values_name_the_variable() {
        let err = LineCredentials::new(None, Some(GROUP)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(config_key(err), TOKEN_KEY);

        let err = LineCredentials::new(Some("token"), Some("   ")).unwrap_err();
        assert_eq!(config_key(err), GROUP_KEY);
    }

    #[test]
    fn rejects_malformed_group_id() {
        for bad in [
            "group-1",
            "X0123456789abcdef0123456789abcdef",
            "C0123456789abcdef0123456789abcde",
            "C0123456789abcdef0123456789abcdeg",
        ] {
            let err = LineCredentials::new(Some("token"), Some(bad)).unwrap_err();
            assert_eq!(config_key(err), GROUP_KEY, "{bad}");
        }
    }

    #[test]
    fn rejects_token_with_inner_whitespace() {
        let err = LineCredentials::new(Some("abc def"), Some(GROUP)).unwrap_err();
        assert_eq!(config_key(err), TOKEN_KEY);
        let err = LineCredentials::new(Some("トークン"), Some(GROUP)).unwrap_err();
        assert_eq!(config_key(err), TOKEN_KEY);
    }

    #[test]
    fn debug_hides_token() {
        let creds = LineCredentials::new(Some("s3cret"), Some(GROUP)).unwrap();
        let shown = format!("{creds:?}");
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains(GROUP));
    }
}
