// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock domain tool with a fixed outcome.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use waypoint_core::WaypointError;
use waypoint_tools::{Tool, ToolContext, ToolOutcome};

/// A tool that always returns the same outcome and counts its calls.
pub struct MockTool {
    name: String,
    description: String,
    outcome: ToolOutcome,
    calls: AtomicUsize,
    last_call: Mutex<Option<(Value, ToolContext)>>,
}

impl MockTool {
    /// A tool that succeeds with `data`.
    pub fn new(name: impl Into<String>, description: impl Into<String>, data: Value) -> Self {
        Self::with_outcome(name, description, ToolOutcome::ok(data))
    }

    /// A tool that reports failure with `error`.
    pub fn failing(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self::with_outcome(name, "always fails", ToolOutcome::failed(error))
    }

    fn with_outcome(
        name: impl Into<String>,
        description: impl Into<String>,
        outcome: ToolOutcome,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            outcome,
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Parameters and context of the most recent call.
    pub fn last_call(&self) -> Option<(Value, ToolContext)> {
        self.last_call
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "target": { "type": "string" } }
        })
    }

    async fn execute(
        &self,
        params: Value,
        context: &ToolContext,
    ) -> Result<ToolOutcome, WaypointError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_call
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some((params, context.clone()));
        Ok(self.outcome.clone())
    }
}
