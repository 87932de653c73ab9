// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock response generator for deterministic testing.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use waypoint_core::{GenerateParams, ResponseGenerator, TaskType};

/// A [`ResponseGenerator`] with scripted replies.
///
/// Each task type has its own FIFO queue. When a queue is empty the default
/// reply is returned (`"mock response"` unless configured otherwise). `None`
/// entries simulate a gateway that gave up.
pub struct MockGenerator {
    replies: Mutex<HashMap<TaskType, VecDeque<Option<String>>>>,
    default_reply: Option<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<GenerateParams>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            default_reply: Some("mock response".to_string()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A generator whose unscripted calls all fail.
    pub fn failing() -> Self {
        Self {
            default_reply: None,
            ..Self::new()
        }
    }

    /// Queues `reply` for the next call of `task`.
    pub fn with_reply(mut self, task: TaskType, reply: Option<&str>) -> Self {
        self.replies
            .get_mut()
            .entry(task)
            .or_default()
            .push_back(reply.map(str::to_string));
        self
    }

    /// Delays every reply, for timeout and cancellation tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queues a reply on a shared generator.
    pub async fn push_reply(&self, task: TaskType, reply: Option<String>) {
        self.replies
            .lock()
            .await
            .entry(task)
            .or_default()
            .push_back(reply);
    }

    /// Every call received so far, in order.
    pub async fn calls(&self) -> Vec<GenerateParams> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub async fn calls_for(&self, task: TaskType) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|p| p.task_type == task)
            .count()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseGenerator for MockGenerator {
    async fn generate_response(&self, params: GenerateParams) -> Option<String> {
        let task = params.task_type;
        self.calls.lock().await.push(params);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .replies
            .lock()
            .await
            .get_mut(&task)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(reply) => reply,
            None => self.default_reply.clone(),
        }
    }
}
