// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The lead-to-sale transfer as a single transaction.

use leadflow_core::{Lead, LeadRecord, LeadflowError, Sale, SaleRecord};
use tracing::debug;

use crate::database::{Database, map_tr_err};
use crate::models::{WriteOutcome, is_constraint_violation};
use crate::queries::leads::update_lead_row;
use crate::queries::outcome_to_result;
use crate::queries::sales::insert_sale_row;

/// Persist a transfer: the version-checked lead update and the sale insert
/// commit together or not at all.
///
/// A stale lead version, or an existing sale for the lead, rolls back the
/// whole unit and returns [`LeadflowError::Conflict`].
pub async fn commit_transfer(
    db: &Database,
    lead: &Lead,
    expected_lead_version: u64,
    sale: &Sale,
) -> Result<(), LeadflowError> {
    let lead_record = LeadRecord::from(lead);
    let sale_record = SaleRecord::from(sale);
    let lead_id = lead_record.id.to_string();

    let outcome = db
        .connection()
        .call(move |conn| -> Result<WriteOutcome, rusqlite::Error> {
            let tx = conn.transaction()?;

            let lead_outcome = update_lead_row(&tx, &lead_record, expected_lead_version)?;
            if lead_outcome != WriteOutcome::Applied {
                // Dropping `tx` rolls back.
                return Ok(lead_outcome);
            }

            match insert_sale_row(&tx, &sale_record) {
                Ok(()) => {}
                Err(e) if is_constraint_violation(&e) => return Ok(WriteOutcome::Duplicate),
                Err(e) => return Err(e),
            }

            tx.commit()?;
            Ok(WriteOutcome::Applied)
        })
        .await
        .map_err(map_tr_err)?;

    if outcome == WriteOutcome::Duplicate {
        return Err(LeadflowError::Conflict {
            entity: "lead",
            id: lead_id,
            reason: "a sale already exists for this lead".to_string(),
        });
    }
    outcome_to_result(outcome, "lead", lead_id)?;
    debug!(lead_id = %lead.id(), sale_id = %sale.id(), "transfer committed");
    Ok(())
}
