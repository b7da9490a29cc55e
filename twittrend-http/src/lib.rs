//! Minimal HTTP client with safe logging and bearer auth.
//!
//! - Request options: headers, `Auth`, timeout
//! - Charset-aware text bodies for scraping (`get_text`)
//! - JSON POSTs that hand back the raw status and body (`post_json_raw`)
//! - Never logs secret values; optional *raw* request/response logging via
//!   `TWITTREND_HTTP_RAW=1`
//!
//! Every call is a single attempt. Callers decide what a failure means.
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), twittrend_http::HttpError> {
//! let client = twittrend_http::HttpClient::new("https://twittrend.jp/")?;
//! let page = client
//!     .get_text("", twittrend_http::RequestOpts::default())
//!     .await?;
//! assert!(!page.body.is_empty());
//! # Ok(()) }
//! ```
//!
//! Security: `Auth::Bearer` values are sanitized before use, and logs only
//! ever include the auth kind (bearer/none), not the secret.

pub mod charset;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use std::env;
use std::time::Duration;
use thiserror::Error;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "TWITTREND_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap, body: Option<&[u8]>) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    if let Some(bytes) = body {
        if let Ok(s) = std::str::from_utf8(bytes) {
            let mut s = s.to_string();
            if s.len() > RAW_MAX_BODY {
                s = truncate_on_char_boundary(&s, RAW_MAX_BODY).to_string();
                s.push('…');
            }
            parts.push(format!("-d '{}'", s.replace('\'', r"'\''")));
        } else {
            parts.push(format!("--data-binary @- # ({} bytes)", bytes.len()));
        }
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if key.eq_ignore_ascii_case("authorization") {
                val = "Bearer <redacted>".into();
            }
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ==============================
// Auth & Request Options
// ==============================

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use twittrend_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// match bearer {
///     Auth::Bearer(value) => assert_eq!(value, "token"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    None,
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use twittrend_http::{Auth, RequestOpts};
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(10)),
///     auth: Some(Auth::Bearer("secret")),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 10);
/// assert!(opts.headers.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
}

/// A decoded text body plus the metadata scrapers care about.
#[derive(Debug, Clone)]
pub struct TextResponse {
    pub url: Url,
    pub status: StatusCode,
    pub encoding: &'static str,
    pub body: String,
}

/// Status and body of a request whose outcome the caller judges.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub request_id: String,
    pub body: String,
}

impl RawResponse {
    /// Best-effort human message from a JSON error envelope, else a body snippet.
    pub fn error_message(&self) -> String {
        extract_error_message(self.body.as_bytes())
    }
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use twittrend_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.line.me/")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(10));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(10),
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    ///
    /// ```no_run
    /// use twittrend_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://twittrend.jp/")?
    ///     .with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Duration::from_secs(2));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET a text document. Non-success statuses are errors; the body is
    /// decoded with the declared or sniffed charset.
    pub async fn get_text(
        &self,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<TextResponse, HttpError> {
        let url = self.resolve(path)?;
        let exchange = self.execute(Method::GET, url.clone(), None, &opts).await?;

        if !exchange.status.is_success() {
            let message = extract_error_message(&exchange.bytes);
            tracing::warn!(
                req_id=%exchange.req_id,
                status=%exchange.status,
                message=%message,
                x_request_id=%exchange.request_id,
                "http.error"
            );
            return Err(HttpError::Api {
                status: exchange.status,
                message,
                request_id: exchange.request_id,
            });
        }

        let content_type = exchange
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        let (body, encoding, had_errors) = charset::decode_body(content_type, &exchange.bytes);
        tracing::debug!(
            req_id=%exchange.req_id,
            encoding=encoding.name(),
            had_errors,
            chars=body.chars().count(),
            "http.response.decoded"
        );

        Ok(TextResponse {
            url,
            status: exchange.status,
            encoding: encoding.name(),
            body,
        })
    }

    /// POST a JSON body and return whatever the server answered.
    pub async fn post_json_raw<B>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<RawResponse, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.resolve(path)?;
        let bytes = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        let exchange = self
            .execute(Method::POST, url, Some(bytes), &opts)
            .await?;

        Ok(RawResponse {
            status: exchange.status,
            request_id: exchange.request_id,
            body: String::from_utf8_lossy(&exchange.bytes).into_owned(),
        })
    }

    fn resolve(&self, path: &str) -> Result<Url, HttpError> {
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    // ==============================
    // Core request implementation
    // ==============================

    async fn execute(
        &self,
        method: Method,
        url: Url,
        json_body: Option<Vec<u8>>,
        opts: &RequestOpts<'_>,
    ) -> Result<Exchange, HttpError> {
        let mut rb = self.inner.request(method.clone(), url.clone());

        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        rb = rb.timeout(timeout);

        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }

        if let Some(bytes) = &json_body {
            rb = rb
                .header(CONTENT_TYPE, "application/json")
                .body(bytes.clone());
        }

        if let Some(auth) = &opts.auth {
            match auth {
                Auth::Bearer(tok) => {
                    let tok = sanitize_api_key(tok)?;
                    rb = rb.bearer_auth(tok);
                }
                Auth::None => {}
            }
        }

        // ----- Safe request logging (pre-send) -----
        let auth_kind = auth_kind(opts.auth.as_ref());

        // Lightweight request id without extra deps
        let req_id = format!(
            "r{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%host_path(&url),
            timeout_ms=timeout.as_millis() as u64,
            auth_kind,
            has_body=%json_body.is_some(),
            "http.request.start"
        );

        if raw_enabled() {
            let merged = opts.headers.clone().unwrap_or_default();
            let curl = make_curl(&method, &url, &merged, json_body.as_deref());
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        // ----- Send -----
        let t0 = std::time::Instant::now();
        let resp = rb.send().await.map_err(|err| {
            let message = describe_reqwest_error(&err);
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.send");
            HttpError::Network(message)
        })?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|err| {
            let message = describe_reqwest_error(&err);
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.body");
            HttpError::Network(message)
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let request_id = headers
            .get("x-line-request-id")
            .or_else(|| headers.get("x-request-id"))
            .or_else(|| headers.get("x-correlation-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            x_request_id=%request_id,
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&headers);
            let truncated = bytes.len() > RAW_MAX_BODY;
            let text = String::from_utf8_lossy(&bytes[..bytes.len().min(RAW_MAX_BODY)]);
            tracing::info!(
                target:"http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%text,
                truncated
            );
        }

        tracing::trace!(
            req_id=%req_id,
            body_snippet=%snip_body(&bytes),
            "http.response.body_snippet"
        );

        Ok(Exchange {
            req_id,
            status,
            headers,
            request_id,
            bytes: bytes.to_vec(),
        })
    }
}

struct Exchange {
    req_id: String,
    status: StatusCode,
    headers: HeaderMap,
    request_id: String,
    bytes: Vec<u8>,
}

// ==============================
// Helpers
// ==============================

/// Loggable name of the auth strategy; never the credential.
fn auth_kind(auth: Option<&Auth<'_>>) -> &'static str {
    match auth {
        Some(Auth::Bearer(_)) => "bearer",
        Some(Auth::None) | None => "none",
    }
}

fn host_path(url: &Url) -> String {
    format!("{}{}", url.host_str().unwrap_or("-"), url.path())
}

fn describe_reqwest_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}

fn extract_error_message(body: &[u8]) -> String {
    // LINE style: {"message":"...","details":[{"message":"...","property":"to"}]}
    #[derive(serde::Deserialize)]
    struct Envelope {
        #[serde(default)]
        message: String,
        #[serde(default)]
        details: Vec<Detail>,
        #[serde(default)]
        error: String,
    }
    #[derive(serde::Deserialize)]
    struct Detail {
        #[serde(default)]
        message: String,
        #[serde(default)]
        property: String,
    }

    if let Ok(env) = serde_json::from_slice::<Envelope>(body) {
        let mut message = if env.message.is_empty() {
            env.error
        } else {
            env.message
        };
        let details: Vec<String> = env
            .details
            .iter()
            .filter(|d| !d.message.is_empty())
            .map(|d| {
                if d.property.is_empty() {
                    d.message.clone()
                } else {
                    format!("{}: {}", d.property, d.message)
                }
            })
            .collect();
        if !details.is_empty() {
            message = format!("{message} ({})", details.join("; "));
        }
        if !message.trim().is_empty() {
            return message;
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let snip = String::from_utf8_lossy(body);
    if snip.len() > 500 {
        format!("{}...", truncate_on_char_boundary(&snip, 500))
    } else {
        snip.into_owned()
    }
}

fn truncate_on_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    // 1) Trim outer spaces/quotes
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();

    // 2) Remove *all* ASCII whitespace (spaces, tabs, newlines, carriage returns)
    s.retain(|ch| !ch.is_ascii_whitespace());

    // 3) Ensure ASCII and no control chars
    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }

    // 4) Validate header value upfront for clear errors
    HeaderValue::from_str(&format!("Bearer {}", s))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_quotes_and_whitespace() {
        assert_eq!(sanitize_api_key(" \"abc def\n\" ").unwrap(), "abcdef");
    }

    #[test]
    fn sanitize_rejects_non_ascii() {
        assert!(matches!(
            sanitize_api_key("トークン"),
            Err(HttpError::Build(_))
        ));
    }

    #[test]
    fn line_error_envelope_is_flattened() {
        let body = br#"{"message":"The request body has 1 error(s)","details":[{"message":"must be specified","property":"to"}]}"#;
        assert_eq!(
            extract_error_message(body),
            "The request body has 1 error(s) (to: must be specified)"
        );
    }

    #[test]
    fn non_json_error_falls_back_to_snippet() {
        assert_eq!(extract_error_message(b"Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn snippet_truncation_respects_char_boundaries() {
        let long = "東".repeat(400);
        let snip = snip_body(long.as_bytes());
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= 503);
    }

    #[test]
    fn auth_kind_names_strategy_only() {
        assert_eq!(auth_kind(Some(&Auth::Bearer("s3cret"))), "bearer");
        assert_eq!(auth_kind(Some(&Auth::None)), "none");
        assert_eq!(auth_kind(None), "none");
    }

    #[test]
    fn curl_redacts_authorization() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer secret"));
        let url = Url::parse("https://api.line.me/v2/bot/message/push").unwrap();
        let curl = make_curl(&Method::POST, &url, &headers, Some(b"{}"));
        assert!(!curl.contains("secret"));
        assert!(curl.contains("<redacted>"));
    }
}
