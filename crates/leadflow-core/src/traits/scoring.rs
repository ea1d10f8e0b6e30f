// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoring collaborator: the external oracle that rates a lead.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::LeadflowError;
use crate::lead::Lead;
use crate::stage::ColdStage;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AiResult, LeadSource};

/// The only lead data disclosed to the scoring oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoringInput {
    pub source: LeadSource,
    pub stage: ColdStage,
    pub messages_count: u32,
    pub has_business_domain: bool,
}

impl From<&Lead> for ScoringInput {
    fn from(lead: &Lead) -> Self {
        Self {
            source: lead.source(),
            stage: lead.stage(),
            messages_count: lead.messages_count(),
            has_business_domain: lead.business_domain().is_some(),
        }
    }
}

/// Adapter for lead scoring oracles.
///
/// Implementations report an unreachable or unconfigured oracle as
/// [`LeadflowError::ScoringUnavailable`] and unusable answers as
/// [`LeadflowError::Scoring`], never as a business-rule rejection.
#[async_trait]
pub trait ScoringAdapter: PluginAdapter {
    async fn score(&self, input: &ScoringInput) -> Result<AiResult, LeadflowError>;
}
