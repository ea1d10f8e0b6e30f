// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod scoring;
pub mod storage;

pub use adapter::PluginAdapter;
pub use scoring::{ScoringAdapter, ScoringInput};
pub use storage::LeadStore;
