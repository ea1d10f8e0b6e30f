// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Leadflow lifecycle core and its collaborators.

use thiserror::Error;

use crate::stage::{ColdStage, Sequence};

/// The primary error type used across the lifecycle core, its collaborator
/// traits, and every adapter crate.
///
/// Business-rule rejections (stage validation and the transfer gate) each
/// have their own variant so callers can tell them apart without string
/// matching. Collaborator failures are kept separate from rule rejections.
#[derive(Debug, Error)]
pub enum LeadflowError {
    /// The current stage forbids any further transition.
    #[error("cannot change stage: {} is in locked stage '{stage}'", entity_name(.sequence))]
    LockedStage { sequence: Sequence, stage: String },

    /// The requested stage is neither the next stage nor the failure stage.
    #[error(
        "invalid {sequence} stage transition: '{current}' -> '{requested}'; {}",
        allowed_hint(.next, .failure)
    )]
    InvalidTransition {
        sequence: Sequence,
        current: String,
        requested: String,
        /// The single legal forward stage, if the current stage has one.
        next: Option<String>,
        /// The always-legal failure stage of the sequence.
        failure: String,
    },

    /// Transfer attempted before the lead was scored.
    #[error("AI analysis required before transfer; run analysis first")]
    MissingAnalysis,

    /// Transfer attempted with a score under the threshold.
    #[error("AI score {score} is below threshold {threshold}; lead is not ready for sales")]
    ScoreBelowThreshold { score: f64, threshold: f64 },

    /// Transfer attempted on a lead without a business domain.
    #[error("business domain must be set before transfer to sales")]
    MissingDomain,

    /// Transfer attempted from a stage other than `qualified`.
    #[error("lead must be in 'qualified' stage to transfer; current: '{current}'")]
    WrongStage { current: ColdStage },

    /// The scoring collaborator cannot be reached or is not configured.
    #[error("scoring unavailable: {message}")]
    ScoringUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The scoring collaborator answered, but with an error or unusable output.
    #[error("scoring failed: {message}")]
    Scoring {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A write lost a race against another writer (stale version or duplicate).
    #[error("conflicting update on {entity} {id}: {reason}")]
    Conflict {
        entity: &'static str,
        id: String,
        reason: String,
    },

    /// Storage backend errors (database connection, query failure, decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (missing credentials, invalid header values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LeadflowError {
    /// Returns true for rejections produced by the stage validator or the
    /// transfer gate, as opposed to collaborator failures.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            Self::LockedStage { .. }
                | Self::InvalidTransition { .. }
                | Self::MissingAnalysis
                | Self::ScoreBelowThreshold { .. }
                | Self::MissingDomain
                | Self::WrongStage { .. }
        )
    }

    /// Stable snake_case tag identifying the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LockedStage { .. } => "locked_stage",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::MissingAnalysis => "missing_analysis",
            Self::ScoreBelowThreshold { .. } => "score_below_threshold",
            Self::MissingDomain => "missing_domain",
            Self::WrongStage { .. } => "wrong_stage",
            Self::ScoringUnavailable { .. } => "scoring_unavailable",
            Self::Scoring { .. } => "scoring_failed",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Storage { .. } => "storage",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }

    /// Shorthand for a [`LeadflowError::Storage`] wrapping any error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }
}

fn entity_name(sequence: &Sequence) -> &'static str {
    sequence.entity()
}

fn allowed_hint(next: &Option<String>, failure: &str) -> String {
    match next {
        Some(next) => format!("next allowed: '{next}' or '{failure}'"),
        None => format!("'{failure}' has no further stages"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_message_names_both_legal_targets() {
        let err = LeadflowError::InvalidTransition {
            sequence: Sequence::Cold,
            current: "new".into(),
            requested: "qualified".into(),
            next: Some("contacted".into()),
            failure: "lost".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'new' -> 'qualified'"), "got: {msg}");
        assert!(msg.contains("next allowed: 'contacted' or 'lost'"), "got: {msg}");
    }

    #[test]
    fn invalid_transition_from_last_stage_has_no_next() {
        let err = LeadflowError::InvalidTransition {
            sequence: Sequence::Sale,
            current: "lost".into(),
            requested: "new".into(),
            next: None,
            failure: "lost".into(),
        };
        assert!(err.to_string().contains("'lost' has no further stages"));
    }

    #[test]
    fn locked_stage_message_names_entity_and_stage() {
        let err = LeadflowError::LockedStage {
            sequence: Sequence::Sale,
            stage: "paid".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot change stage: sale is in locked stage 'paid'"
        );
    }

    #[test]
    fn score_below_threshold_keeps_exact_score() {
        let err = LeadflowError::ScoreBelowThreshold {
            score: 0.59999,
            threshold: 0.6,
        };
        assert!(err.to_string().contains("0.59999"));
    }

    #[test]
    fn business_rule_classification() {
        assert!(LeadflowError::MissingAnalysis.is_business_rule());
        assert!(LeadflowError::MissingDomain.is_business_rule());
        assert!(
            LeadflowError::WrongStage {
                current: ColdStage::Contacted
            }
            .is_business_rule()
        );
        assert!(
            !LeadflowError::ScoringUnavailable {
                message: "no key".into(),
                source: None,
            }
            .is_business_rule()
        );
        assert!(
            !LeadflowError::NotFound {
                entity: "lead",
                id: "x".into(),
            }
            .is_business_rule()
        );
    }

    #[test]
    fn kinds_are_distinct_for_transfer_failures() {
        let kinds = [
            LeadflowError::MissingAnalysis.kind(),
            LeadflowError::ScoreBelowThreshold {
                score: 0.4,
                threshold: 0.6,
            }
            .kind(),
            LeadflowError::MissingDomain.kind(),
            LeadflowError::WrongStage {
                current: ColdStage::New,
            }
            .kind(),
        ];
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
    }
}
