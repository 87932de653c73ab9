// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Waypoint integration tests.
//!
//! Provides mock adapters and a pipeline harness for fast, deterministic,
//! CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockGenerator`] - scripted model output per task type, with call recording
//! - [`MockProvider`] - scripted provider adapter (text, errors, rate limits, hangs)
//! - [`MockTool`] - fixed-outcome tool with a call counter
//! - [`MockStrategy`] - scripted strategy-context dependency
//! - [`TestHarness`] - a full [`CascadePipeline`](waypoint_agent::CascadePipeline) over the mocks

pub mod harness;
pub mod mock_generator;
pub mod mock_provider;
pub mod mock_strategy;
pub mod mock_tool;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_generator::MockGenerator;
pub use mock_provider::{MockProvider, MockReply};
pub use mock_strategy::MockStrategy;
pub use mock_tool::MockTool;
