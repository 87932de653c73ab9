// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The boundary the cascade tiers use to ask for model output.

use async_trait::async_trait;

use crate::types::GenerateParams;

/// Produces model-generated text for a task.
///
/// Never fails past its boundary: every unrecoverable failure is `None`,
/// and the caller decides what the user sees instead.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate_response(&self, params: GenerateParams) -> Option<String>;
}
