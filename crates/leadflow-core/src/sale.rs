// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sale entity and its lifecycle operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LeadflowError;
use crate::stage::{SaleStage, Stage};
use crate::transition;
use crate::types::{LeadId, SaleId, stamp_now};

/// A sale moving through the sale sequence. Created only by a transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    id: SaleId,
    lead_id: LeadId,
    stage: SaleStage,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Sale {
    /// Opens a sale in stage `new` bound to `lead_id`.
    pub(crate) fn open_for(lead_id: LeadId) -> Self {
        let now = stamp_now();
        Self {
            id: SaleId::new(),
            lead_id,
            stage: SaleStage::INITIAL,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn id(&self) -> SaleId {
        self.id
    }

    pub fn lead_id(&self) -> LeadId {
        self.lead_id
    }

    pub fn stage(&self) -> SaleStage {
        self.stage
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Moves the sale to `requested` if the sale-sequence rules allow it.
    pub fn update_stage(&mut self, requested: SaleStage) -> Result<(), LeadflowError> {
        transition::validate(self.stage, requested)?;
        debug!(sale_id = %self.id, from = %self.stage, to = %requested, "sale stage approved");
        self.stage = requested;
        self.updated_at = stamp_now();
        self.version += 1;
        Ok(())
    }

    pub fn from_record(record: SaleRecord) -> Self {
        Self {
            id: record.id,
            lead_id: record.lead_id,
            stage: record.stage,
            created_at: record.created_at,
            updated_at: record.updated_at,
            version: record.version,
        }
    }
}

/// Flat, caller-facing shape of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: SaleId,
    pub lead_id: LeadId,
    pub stage: SaleStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub version: u64,
}

impl From<&Sale> for SaleRecord {
    fn from(sale: &Sale) -> Self {
        Self {
            id: sale.id,
            lead_id: sale.lead_id,
            stage: sale.stage,
            created_at: sale.created_at,
            updated_at: sale.updated_at,
            version: sale.version,
        }
    }
}
