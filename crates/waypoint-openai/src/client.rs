// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat-completions endpoints.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};
use waypoint_core::WaypointError;

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// Authenticated client bound to one endpoint.
///
/// Each call carries its own timeout; there is no client-wide retry, the
/// model gateway owns the fallback chain.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    provider: String,
    endpoint: String,
}

impl OpenAiClient {
    /// Creates a client for `{base_url}/chat/completions` using Bearer auth.
    pub fn new(provider: &str, api_key: &str, base_url: &str) -> Result<Self, WaypointError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
            WaypointError::Config(format!("invalid API key header value for `{provider}`: {e}"))
        })?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

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
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one completion request bounded by `timeout`.
    pub async fn complete(
        &self,
        request: &ChatRequest,
        timeout: Duration,
    ) -> Result<ChatResponse, WaypointError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e, timeout))?;

        let status = response.status();
        debug!(provider = %self.provider, model = %request.model, status = %status, "completion response received");

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
            let detail = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            warn!(provider = %self.provider, status = status.as_u16(), "provider returned an error status");
            return Err(WaypointError::Provider {
                message: format!("{} returned {status}: {detail}", self.provider),
                status: Some(status.as_u16()),
                source: None,
            });
        }

        serde_json::from_str(&body).map_err(|e| WaypointError::Provider {
            message: format!("failed to parse {} response: {e}", self.provider),
            status: Some(status.as_u16()),
            source: Some(Box::new(e)),
        })
    }

    fn transport_error(&self, e: reqwest::Error, timeout: Duration) -> WaypointError {
        if e.is_timeout() {
            return WaypointError::Timeout { duration: timeout };
        }
        WaypointError::Provider {
            message: format!("request to {} failed: {e}", self.provider),
            status: None,
            source: Some(Box::new(e)),
        }
    }
}
