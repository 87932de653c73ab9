// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock model provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with pre-configured replies,
//! enabling gateway tests without external API calls.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;
use waypoint_core::{
    AdapterType, GenerationRequest, HealthStatus, PluginAdapter, ProviderAdapter, WaypointError,
};

/// One scripted provider outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Text(String),
    /// A non-success HTTP status.
    Error(u16),
    RateLimited,
    /// Never answers; the caller's timeout must fire.
    Hang,
}

/// A mock provider that pops scripted replies from a FIFO queue.
///
/// When the queue is empty, `"mock response"` is returned.
pub struct MockProvider {
    name: String,
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_replies(name: impl Into<String>, replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::new(name)
        }
    }

    /// Add a reply to the end of the queue.
    pub async fn add_reply(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Every request received so far, in order.
    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, WaypointError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WaypointError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<String, WaypointError> {
        let model = request.model.clone();
        self.requests.lock().await.push(request);

        let reply = self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::Text("mock response".to_string()));

        match reply {
            MockReply::Text(text) => Ok(text),
            MockReply::Error(status) => Err(WaypointError::Provider {
                message: format!("API returned {status}"),
                status: Some(status),
                source: None,
            }),
            MockReply::RateLimited => Err(WaypointError::RateLimited {
                provider: self.name.clone(),
                model,
            }),
            MockReply::Hang => std::future::pending().await,
        }
    }
}
