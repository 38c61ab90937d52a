//! Shared blocking HTTP client for the upstream news and quote endpoints.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::domain::error::StockevalError;

pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client with a desktop browser User-Agent and a per-request timeout.
pub fn build_client(timeout: Duration) -> Result<Client, StockevalError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| StockevalError::upstream("http", format!("failed to build client: {}", e)))
}

/// Send `request` and return the body decoded as text.
///
/// `charset` overrides the encoding for pages that do not declare it in
/// the `Content-Type` header (Sina serves GBK).
pub fn fetch_text(
    source: &str,
    request: RequestBuilder,
    charset: Option<&str>,
) -> Result<String, StockevalError> {
    let resp = request
        .send()
        .map_err(|e| StockevalError::upstream(source, e.to_string()))?;
    let status = resp.status();
    debug!(source, url = %resp.url(), %status, "response");
    if !status.is_success() {
        return Err(StockevalError::upstream(source, format!("HTTP {}", status)));
    }
    let body = match charset {
        Some(cs) => resp.text_with_charset(cs),
        None => resp.text(),
    };
    body.map_err(|e| StockevalError::upstream(source, format!("failed to read body: {}", e)))
}
