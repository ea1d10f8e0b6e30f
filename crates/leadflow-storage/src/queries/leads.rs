// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead CRUD operations.

use leadflow_core::{Lead, LeadId, LeadRecord, LeadflowError};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{
    LEAD_COLUMNS, WriteOutcome, format_timestamp, is_constraint_violation, lead_from_row,
    version_to_sql,
};
use crate::queries::outcome_to_result;

/// Insert a newly created lead.
pub async fn insert_lead(db: &Database, lead: &Lead) -> Result<(), LeadflowError> {
    let record = LeadRecord::from(lead);
    let id = record.id.to_string();
    let outcome = db
        .connection()
        .call(move |conn| -> Result<WriteOutcome, rusqlite::Error> {
            let result = conn.execute(
                "INSERT INTO leads (id, source, stage, business_domain, messages_count,
                     ai_score, ai_recommendation, ai_reason, ai_analyzed_at,
                     version, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    record.id.to_string(),
                    record.source.to_string(),
                    record.stage.to_string(),
                    record.business_domain.map(|d| d.to_string()),
                    record.messages_count,
                    record.ai_score,
                    record.ai_recommendation,
                    record.ai_reason,
                    record.ai_analyzed_at.as_ref().map(format_timestamp),
                    version_to_sql(record.version)?,
                    format_timestamp(&record.created_at),
                    format_timestamp(&record.updated_at),
                ],
            );
            match result {
                Ok(_) => Ok(WriteOutcome::Applied),
                Err(e) if is_constraint_violation(&e) => Ok(WriteOutcome::Duplicate),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;
    outcome_to_result(outcome, "lead", id)
}

/// Get a lead by ID.
pub async fn get_lead(db: &Database, id: LeadId) -> Result<Option<Lead>, LeadflowError> {
    let record = db
        .connection()
        .call(move |conn| -> Result<Option<LeadRecord>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1"),
                params![id.to_string()],
                lead_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    record.map(Lead::from_record).transpose()
}

/// List all leads, newest first.
pub async fn list_leads(db: &Database) -> Result<Vec<Lead>, LeadflowError> {
    let records = db
        .connection()
        .call(|conn| -> Result<Vec<LeadRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LEAD_COLUMNS} FROM leads ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt.query_map([], lead_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;
    records.into_iter().map(Lead::from_record).collect()
}

/// Overwrite the mutable columns of a lead if the stored version still
/// equals `expected_version`.
pub async fn save_lead(
    db: &Database,
    lead: &Lead,
    expected_version: u64,
) -> Result<(), LeadflowError> {
    let record = LeadRecord::from(lead);
    let id = record.id.to_string();
    let outcome = db
        .connection()
        .call(move |conn| -> Result<WriteOutcome, rusqlite::Error> {
            update_lead_row(conn, &record, expected_version)
        })
        .await
        .map_err(map_tr_err)?;
    outcome_to_result(outcome, "lead", id)
}

/// Version-checked UPDATE shared by plain saves and transfers.
///
/// `source`, `created_at`, and `id` are immutable and never written here.
pub(crate) fn update_lead_row(
    conn: &rusqlite::Connection,
    record: &LeadRecord,
    expected_version: u64,
) -> rusqlite::Result<WriteOutcome> {
    let id = record.id.to_string();
    let updated = conn.execute(
        "UPDATE leads SET stage = ?2, business_domain = ?3, messages_count = ?4,
             ai_score = ?5, ai_recommendation = ?6, ai_reason = ?7, ai_analyzed_at = ?8,
             version = ?9, updated_at = ?10
         WHERE id = ?1 AND version = ?11",
        params![
            id,
            record.stage.to_string(),
            record.business_domain.map(|d| d.to_string()),
            record.messages_count,
            record.ai_score,
            record.ai_recommendation,
            record.ai_reason,
            record.ai_analyzed_at.as_ref().map(format_timestamp),
            version_to_sql(record.version)?,
            format_timestamp(&record.updated_at),
            version_to_sql(expected_version)?,
        ],
    )?;
    if updated == 1 {
        return Ok(WriteOutcome::Applied);
    }

    let exists = conn
        .query_row("SELECT 1 FROM leads WHERE id = ?1", params![id], |_| Ok(()))
        .optional()?
        .is_some();
    Ok(if exists {
        WriteOutcome::Stale
    } else {
        WriteOutcome::Missing
    })
}
