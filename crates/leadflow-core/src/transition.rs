// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stage transition validator shared by both lifecycles.

use crate::error::LeadflowError;
use crate::stage::Stage;

/// Decides whether `current → requested` is a legal move in `S`'s sequence.
///
/// Rules, in order:
/// 1. A locked `current` rejects everything with [`LeadflowError::LockedStage`].
/// 2. The failure stage is approved from any other stage.
/// 3. Otherwise `requested` must rank exactly one above `current`.
///
/// Re-requesting the current stage is never approved. For `lost → lost` this
/// surfaces as [`LeadflowError::InvalidTransition`], since `lost` is not in
/// the locked set.
pub fn validate<S: Stage>(current: S, requested: S) -> Result<(), LeadflowError> {
    if current.is_locked() {
        return Err(LeadflowError::LockedStage {
            sequence: S::SEQUENCE,
            stage: current.to_string(),
        });
    }

    if requested == S::FAILURE && current != S::FAILURE {
        return Ok(());
    }

    if requested.rank() == current.rank() + 1 {
        return Ok(());
    }

    Err(LeadflowError::InvalidTransition {
        sequence: S::SEQUENCE,
        current: current.to_string(),
        requested: requested.to_string(),
        next: current.next().map(|s| s.to_string()),
        failure: S::FAILURE.to_string(),
    })
}
