// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules for Leadflow storage entities.

pub mod leads;
pub mod sales;
pub mod transfer;

use leadflow_core::LeadflowError;

use crate::models::WriteOutcome;

/// Turns a non-applied write outcome into the matching error.
pub(crate) fn outcome_to_result(
    outcome: WriteOutcome,
    entity: &'static str,
    id: String,
) -> Result<(), LeadflowError> {
    match outcome {
        WriteOutcome::Applied => Ok(()),
        WriteOutcome::Missing => Err(LeadflowError::NotFound { entity, id }),
        WriteOutcome::Stale => Err(LeadflowError::Conflict {
            entity,
            id,
            reason: "modified concurrently; reload and retry".to_string(),
        }),
        WriteOutcome::Duplicate => Err(LeadflowError::Conflict {
            entity,
            id,
            reason: "already exists".to_string(),
        }),
    }
}
