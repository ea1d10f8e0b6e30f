// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sale read and update operations.
//!
//! Sales are only ever inserted by [`crate::queries::transfer::commit_transfer`].

use leadflow_core::{LeadId, LeadflowError, Sale, SaleId, SaleRecord};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{SALE_COLUMNS, WriteOutcome, format_timestamp, sale_from_row, version_to_sql};
use crate::queries::outcome_to_result;

/// Get a sale by ID.
pub async fn get_sale(db: &Database, id: SaleId) -> Result<Option<Sale>, LeadflowError> {
    let record = db
        .connection()
        .call(move |conn| -> Result<Option<SaleRecord>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"),
                params![id.to_string()],
                sale_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    Ok(record.map(Sale::from_record))
}

/// Get the sale created from a given lead, if it was transferred.
pub async fn get_sale_by_lead(
    db: &Database,
    lead_id: LeadId,
) -> Result<Option<Sale>, LeadflowError> {
    let record = db
        .connection()
        .call(move |conn| -> Result<Option<SaleRecord>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {SALE_COLUMNS} FROM sales WHERE lead_id = ?1"),
                params![lead_id.to_string()],
                sale_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    Ok(record.map(Sale::from_record))
}

/// Persist a sale stage change if the stored version still equals
/// `expected_version`.
pub async fn save_sale(
    db: &Database,
    sale: &Sale,
    expected_version: u64,
) -> Result<(), LeadflowError> {
    let record = SaleRecord::from(sale);
    let id = record.id.to_string();
    let outcome = db
        .connection()
        .call(move |conn| -> Result<WriteOutcome, rusqlite::Error> {
            let sale_id = record.id.to_string();
            let updated = conn.execute(
                "UPDATE sales SET stage = ?2, version = ?3, updated_at = ?4
                 WHERE id = ?1 AND version = ?5",
                params![
                    sale_id,
                    record.stage.to_string(),
                    version_to_sql(record.version)?,
                    format_timestamp(&record.updated_at),
                    version_to_sql(expected_version)?,
                ],
            )?;
            if updated == 1 {
                return Ok(WriteOutcome::Applied);
            }
            let exists = conn
                .query_row("SELECT 1 FROM sales WHERE id = ?1", params![sale_id], |_| {
                    Ok(())
                })
                .optional()?
                .is_some();
            Ok(if exists {
                WriteOutcome::Stale
            } else {
                WriteOutcome::Missing
            })
        })
        .await
        .map_err(map_tr_err)?;
    outcome_to_result(outcome, "sale", id)
}

/// INSERT for a freshly opened sale; runs inside the transfer transaction.
pub(crate) fn insert_sale_row(
    conn: &rusqlite::Connection,
    record: &SaleRecord,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO sales (id, lead_id, stage, version, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.id.to_string(),
            record.lead_id.to_string(),
            record.stage.to_string(),
            version_to_sql(record.version)?,
            format_timestamp(&record.created_at),
            format_timestamp(&record.updated_at),
        ],
    )?;
    Ok(())
}
