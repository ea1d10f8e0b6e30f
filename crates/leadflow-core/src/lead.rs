// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead entity and its lifecycle operations.
//!
//! Fields are private: the stage only moves through [`Lead::update_stage`]
//! (or the transfer gate), and the AI annotation bundle is written as one
//! unit by [`Lead::record_ai_analysis`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LeadflowError;
use crate::stage::{ColdStage, Stage};
use crate::transition;
use crate::types::{AiResult, BusinessDomain, LeadId, LeadSource, stamp_now};

/// The AI annotation bundle. Present only after a scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub score: f64,
    pub recommendation: String,
    pub reason: String,
    pub analyzed_at: DateTime<Utc>,
}

/// A lead moving through the cold sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Lead {
    id: LeadId,
    source: LeadSource,
    stage: ColdStage,
    business_domain: Option<BusinessDomain>,
    messages_count: u32,
    analysis: Option<AiAnalysis>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Lead {
    /// Creates a lead in stage `new` with no messages and no analysis.
    pub fn create(source: LeadSource, business_domain: Option<BusinessDomain>) -> Self {
        let now = stamp_now();
        Self {
            id: LeadId::new(),
            source,
            stage: ColdStage::INITIAL,
            business_domain,
            messages_count: 0,
            analysis: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn id(&self) -> LeadId {
        self.id
    }

    pub fn source(&self) -> LeadSource {
        self.source
    }

    pub fn stage(&self) -> ColdStage {
        self.stage
    }

    pub fn business_domain(&self) -> Option<BusinessDomain> {
        self.business_domain
    }

    pub fn messages_count(&self) -> u32 {
        self.messages_count
    }

    pub fn analysis(&self) -> Option<&AiAnalysis> {
        self.analysis.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Optimistic-concurrency counter, bumped by every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Moves the lead to `requested` if the cold-sequence rules allow it.
    ///
    /// On rejection the lead is left untouched and the validator's error is
    /// returned as-is.
    pub fn update_stage(&mut self, requested: ColdStage) -> Result<(), LeadflowError> {
        transition::validate(self.stage, requested)?;
        debug!(lead_id = %self.id, from = %self.stage, to = %requested, "lead stage approved");
        self.stage = requested;
        self.touch();
        Ok(())
    }

    /// Sets the communication counter. Independent of stage.
    pub fn update_messages_count(&mut self, count: u32) {
        self.messages_count = count;
        self.touch();
    }

    /// Overwrites the whole annotation bundle with `result`, stamped now.
    ///
    /// Never changes the stage, whatever the score. A score that is not a
    /// finite value in `[0.0, 1.0]` is rejected and the lead is left as is.
    pub fn record_ai_analysis(&mut self, result: AiResult) -> Result<(), LeadflowError> {
        if !result.has_valid_score() {
            return Err(LeadflowError::Scoring {
                message: format!("score {} is outside [0, 1]", result.score),
                source: None,
            });
        }
        let now = stamp_now();
        self.analysis = Some(AiAnalysis {
            score: result.score,
            recommendation: result.recommendation,
            reason: result.reason,
            analyzed_at: now,
        });
        self.touch_at(now);
        Ok(())
    }

    fn touch(&mut self) {
        self.touch_at(stamp_now());
    }

    fn touch_at(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version += 1;
    }

    /// Rebuilds a lead from its flat record, checking the bundle invariant.
    pub fn from_record(record: LeadRecord) -> Result<Self, LeadflowError> {
        let analysis = match (
            record.ai_score,
            record.ai_recommendation,
            record.ai_reason,
            record.ai_analyzed_at,
        ) {
            (None, None, None, None) => None,
            (Some(score), Some(recommendation), Some(reason), Some(analyzed_at)) => {
                Some(AiAnalysis {
                    score,
                    recommendation,
                    reason,
                    analyzed_at,
                })
            }
            _ => {
                return Err(LeadflowError::Internal(format!(
                    "lead {} has a partial AI annotation bundle",
                    record.id
                )));
            }
        };

        Ok(Self {
            id: record.id,
            source: record.source,
            stage: record.stage,
            business_domain: record.business_domain,
            messages_count: record.messages_count,
            analysis,
            created_at: record.created_at,
            updated_at: record.updated_at,
            version: record.version,
        })
    }
}

/// Flat, caller-facing shape of a lead.
///
/// Enumerations serialize as their string tags. `version` is bookkeeping
/// for persistence and is not serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: LeadId,
    pub source: LeadSource,
    pub stage: ColdStage,
    pub business_domain: Option<BusinessDomain>,
    pub messages_count: u32,
    pub ai_score: Option<f64>,
    pub ai_recommendation: Option<String>,
    pub ai_reason: Option<String>,
    pub ai_analyzed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub version: u64,
}

impl From<&Lead> for LeadRecord {
    fn from(lead: &Lead) -> Self {
        let analysis = lead.analysis.as_ref();
        Self {
            id: lead.id,
            source: lead.source,
            stage: lead.stage,
            business_domain: lead.business_domain,
            messages_count: lead.messages_count,
            ai_score: analysis.map(|a| a.score),
            ai_recommendation: analysis.map(|a| a.recommendation.clone()),
            ai_reason: analysis.map(|a| a.reason.clone()),
            ai_analyzed_at: analysis.map(|a| a.analyzed_at),
            created_at: lead.created_at,
            updated_at: lead.updated_at,
            version: lead.version,
        }
    }
}
