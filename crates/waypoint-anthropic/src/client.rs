// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};
use waypoint_core::WaypointError;

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Default `anthropic-version` header.
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// HTTP client with authentication headers preset.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    provider: String,
    endpoint: String,
}

impl AnthropicClient {
    pub fn new(
        provider: &str,
        api_key: &str,
        api_version: &str,
        base_url: &str,
    ) -> Result<Self, WaypointError> {
        let header = |value: &str, what: &str| {
            HeaderValue::from_str(value)
                .map_err(|e| WaypointError::Config(format!("invalid {what} header value: {e}")))
        };
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", header(api_key, "API key")?);
        headers.insert("anthropic-version", header(api_version, "API version")?);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| WaypointError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            provider: provider.to_string(),
            endpoint: format!("{}/messages", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends a non-streaming request bounded by `timeout`.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
        timeout: Duration,
    ) -> Result<MessageResponse, WaypointError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e, timeout))?;

        let status = response.status();
        debug!(provider = %self.provider, status = %status, "message response received");

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(provider = %self.provider, model = %request.model, "rate limited");
            return Err(WaypointError::RateLimited {
                provider: self.provider.clone(),
                model: request.model.clone(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e, timeout))?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!("{}: {}", api_err.error.type_, api_err.error.message),
                Err(_) => format!("HTTP {status}"),
            };
            warn!(provider = %self.provider, status = status.as_u16(), "provider returned an error status");
            return Err(WaypointError::Provider {
                message: format!("Anthropic API error ({detail})"),
                status: Some(status.as_u16()),
                source: None,
            });
        }

        serde_json::from_str(&body).map_err(|e| WaypointError::Provider {
            message: format!("failed to parse API response: {e}"),
            status: Some(status.as_u16()),
            source: Some(Box::new(e)),
        })
    }

    fn transport_error(&self, e: reqwest::Error, timeout: Duration) -> WaypointError {
        if e.is_timeout() {
            WaypointError::Timeout { duration: timeout }
        } else {
            WaypointError::Provider {
                message: format!("HTTP request to {} failed: {e}", self.provider),
                status: None,
                source: Some(Box::new(e)),
            }
        }
    }
}
