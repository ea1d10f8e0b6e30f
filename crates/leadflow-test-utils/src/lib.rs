// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Leadflow integration tests.
//!
//! Provides in-process collaborator doubles so the lifecycle service and
//! gateway can be exercised without SQLite or the Anthropic API.
//!
//! # Components
//!
//! - [`InMemoryStore`] - `LeadStore` with version checks and atomic transfers
//! - [`MockScorer`] - `ScoringAdapter` with scripted results

pub mod memory_store;
pub mod mock_scorer;

pub use memory_store::InMemoryStore;
pub use mock_scorer::MockScorer;
