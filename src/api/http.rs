//! HTTP utilities for REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and drops non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Strip credentials from a URL before it reaches the logs
fn redact_url(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// HTTP client wrapper for API calls
#[derive(Clone)]
pub struct ApiHttpClient {
    client: Client,
}

impl ApiHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("reify/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request. A 404 is not an error here: it is returned as
    /// `None` so callers can tell a missing resource from a failed request.
    pub async fn get(&self, url: &str) -> Result<Option<Value>> {
        tracing::debug!("GET {}", redact_url(url));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if status == StatusCode::NOT_FOUND {
            tracing::debug!("Not found: {}", redact_url(url));
            return Ok(None);
        }

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(anyhow::anyhow!("API request failed: {}", status));
        }

        serde_json::from_str(&body)
            .map(Some)
            .context("Failed to parse response JSON")
    }
}

/// Format an API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_api_error(error: &anyhow::Error) -> String {
    let error_str = error.to_string();

    if error_str.contains("401") {
        return "Authentication failed. Check BIGML_USERNAME and BIGML_API_KEY.".to_string();
    }
    if error_str.contains("403") {
        return "Permission denied. The resource belongs to another account.".to_string();
    }
    if error_str.contains("429") {
        return "Rate limit exceeded. Please try again later.".to_string();
    }
    if error_str.contains("500") || error_str.contains("503") {
        return "Service temporarily unavailable. Please try again.".to_string();
    }
    if error_str.contains("API request failed") {
        return "Request failed. Check your network connection and try again.".to_string();
    }

    // Truncate long error messages and remove potential sensitive data
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
