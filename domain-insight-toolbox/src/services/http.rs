//! Shared HTTP helpers for the hosted WHOIS source and the completion client.
//!
//! Callers build their own `RequestBuilder` (URL, query, headers, body); this
//! module only sends it, logs the exchange and decodes the body.

use std::time::Duration;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::error::{ToolboxError, ToolboxResult};

/// Maximum number of bytes of a body included in log output.
const TRUNCATE_LIMIT: usize = 256;

/// MSRV-compatible replacement for `str::floor_char_boundary`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        s.len()
    } else {
        let mut i = index;
        while i > 0 && !s.is_char_boundary(i) {
            i -= 1;
        }
        i
    }
}

/// Truncate a response body for logging.
pub(crate) fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}

/// Build a client with the given request timeout.
pub fn build_client(timeout: Duration) -> ToolboxResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ToolboxError::NetworkError(format!("Failed to build HTTP client: {e}")))
}

/// Send a request and return the status code with the body text.
///
/// `target` is only used for logging and must not contain credentials.
pub(crate) async fn execute_request(
    request_builder: RequestBuilder,
    service: &str,
    method: &str,
    target: &str,
) -> ToolboxResult<(u16, String)> {
    log::debug!("[{service}] {method} {target}");

    let response = request_builder.send().await.map_err(|e| {
        if e.is_timeout() {
            ToolboxError::NetworkError(format!("[{service}] request timed out: {e}"))
        } else {
            ToolboxError::NetworkError(format!("[{service}] request failed: {e}"))
        }
    })?;

    let status_code = response.status().as_u16();
    log::debug!("[{service}] Response Status: {status_code}");

    let body = response.text().await.map_err(|e| {
        ToolboxError::NetworkError(format!("[{service}] failed to read response body: {e}"))
    })?;

    log::debug!("[{service}] Response Body: {}", truncate_for_log(&body));

    Ok((status_code, body))
}

/// Decode a JSON body.
pub(crate) fn parse_json<T>(body: &str, service: &str) -> ToolboxResult<T>
where
    T: DeserializeOwned,
{
    serde_json::from_str(body).map_err(|e| {
        log::error!("[{service}] JSON parse failed: {e}");
        log::error!("[{service}] Raw response: {}", truncate_for_log(body));
        ToolboxError::ParseError(format!("[{service}] {e}"))
    })
}
