// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process TTL cache shared by every tier of the decision cascade.
//!
//! - [`TtlCache`]: bounded key/value store with per-entry expiry and
//!   least-recently-used eviction of a configured fraction on overflow
//! - [`generate_key`]: stable key derivation from clamped, sorted arguments
//! - [`CacheRegistry`]: named cache factory with aggregate statistics and a
//!   background janitor

pub mod key;
pub mod registry;
pub mod store;

pub use key::generate_key;
pub use registry::{spawn_janitor, CacheRegistry};
pub use store::{CacheConfig, CacheStats, TtlCache};
