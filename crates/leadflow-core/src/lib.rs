// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Leadflow lead lifecycle engine.
//!
//! This crate holds the stage model, the transition validator, the lead and
//! sale entities, the transfer gate, and the collaborator traits that the
//! storage and scoring adapters implement. It performs no I/O of its own.

pub mod error;
pub mod lead;
pub mod sale;
pub mod stage;
pub mod traits;
pub mod transfer;
pub mod transition;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LeadflowError;
pub use lead::{AiAnalysis, Lead, LeadRecord};
pub use sale::{Sale, SaleRecord};
pub use stage::{ColdStage, SaleStage, Sequence, Stage};
pub use transfer::{MIN_TRANSFER_SCORE, attempt_transfer, check_eligibility};
pub use types::{
    AdapterType, AiResult, BusinessDomain, HealthStatus, LeadId, LeadSource, SaleId,
};

pub use traits::{LeadStore, PluginAdapter, ScoringAdapter, ScoringInput};
