//! Retrieves the trend page. One GET, bounded timeout, browser-like headers.

use crate::trend::RawDocument;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use twittrend_common::{Result, TrendError};
use twittrend_http::{HttpClient, HttpError, RequestOpts};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Where to fetch from and how to present ourselves.
#[derive(Debug, Clone)]
pub struct SourcePage {
    pub url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub accept_language: String,
}

pub struct PageFetcher {
    http: HttpClient,
    url: String,
    headers: HeaderMap,
}

impl PageFetcher {
    pub fn new(source: SourcePage) -> Result<Self> {
        let http = HttpClient::new(&source.url)
            .map_err(|e| TrendError::config("source.url", e.to_string()))?
            .with_timeout(source.timeout);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&source.user_agent)
                .map_err(|e| TrendError::config("source.user_agent", e.to_string()))?,
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&source.accept_language)
                .map_err(|e| TrendError::config("source.accept_language", e.to_string()))?,
        );

        Ok(Self {
            url: http.base().to_string(),
            http,
            headers,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> Result<RawDocument> {
        let page = self
            .http
            .get_text(
                "",
                RequestOpts {
                    headers: Some(self.headers.clone()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| self.fetch_error(e))?;

        tracing::info!(
            url = %page.url,
            status = %page.status,
            encoding = page.encoding,
            bytes = page.body.len(),
            "fetch.page.ok"
        );
        Ok(RawDocument::new(page.url.as_str(), page.encoding, page.body))
    }

    fn fetch_error(&self, err: HttpError) -> TrendError {
        let status = err.status().map(|s| s.as_u16());
        let message = match &err {
            HttpError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        };
        tracing::error!(url = %self.url, ?status, %message, "fetch.page.failed");
        TrendError::Fetch {
            url: self.url.clone(),
            status,
            message,
        }
    }
}
