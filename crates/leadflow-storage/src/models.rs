// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite columns and the core record types.
//!
//! Enumerations are stored as their snake_case tags, identifiers as
//! hyphenated UUID text, and timestamps as RFC 3339 UTC strings with
//! millisecond precision.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use leadflow_core::{LeadRecord, SaleRecord};
use rusqlite::Row;
use rusqlite::types::Type;

/// Column list shared by every lead SELECT; order matches [`lead_from_row`].
pub(crate) const LEAD_COLUMNS: &str = "id, source, stage, business_domain, messages_count, \
     ai_score, ai_recommendation, ai_reason, ai_analyzed_at, version, created_at, updated_at";

/// Column list shared by every sale SELECT; order matches [`sale_from_row`].
pub(crate) const SALE_COLUMNS: &str = "id, lead_id, stage, version, created_at, updated_at";

/// Formats a timestamp the way it is stored.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn conversion_err<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Reads a text column and parses it with `FromStr`.
fn parsed<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    text.parse().map_err(|e| conversion_err(idx, e))
}

fn parsed_opt<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: Option<String> = row.get(idx)?;
    text.map(|t| t.parse().map_err(|e| conversion_err(idx, e)))
        .transpose()
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_timestamp(&text).map_err(|e| conversion_err(idx, e))
}

fn timestamp_opt(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| parse_timestamp(&t).map_err(|e| conversion_err(idx, e)))
        .transpose()
}

fn version(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let raw: i64 = row.get(idx)?;
    u64::try_from(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

/// Converts an entity version to its stored INTEGER form.
pub(crate) fn version_to_sql(version: u64) -> rusqlite::Result<i64> {
    i64::try_from(version).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|dt| dt.with_timezone(&Utc))
}

/// Maps a row selected with [`LEAD_COLUMNS`].
pub(crate) fn lead_from_row(row: &Row<'_>) -> rusqlite::Result<LeadRecord> {
    Ok(LeadRecord {
        id: parsed(row, 0)?,
        source: parsed(row, 1)?,
        stage: parsed(row, 2)?,
        business_domain: parsed_opt(row, 3)?,
        messages_count: row.get(4)?,
        ai_score: row.get(5)?,
        ai_recommendation: row.get(6)?,
        ai_reason: row.get(7)?,
        ai_analyzed_at: timestamp_opt(row, 8)?,
        version: version(row, 9)?,
        created_at: timestamp(row, 10)?,
        updated_at: timestamp(row, 11)?,
    })
}

/// Maps a row selected with [`SALE_COLUMNS`].
pub(crate) fn sale_from_row(row: &Row<'_>) -> rusqlite::Result<SaleRecord> {
    Ok(SaleRecord {
        id: parsed(row, 0)?,
        lead_id: parsed(row, 1)?,
        stage: parsed(row, 2)?,
        version: version(row, 3)?,
        created_at: timestamp(row, 4)?,
        updated_at: timestamp(row, 5)?,
    })
}

/// Outcome of a version-checked write, decided inside the connection thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteOutcome {
    Applied,
    /// No row with the given id.
    Missing,
    /// The row exists but holds a different version.
    Stale,
    /// A uniqueness constraint rejected the insert.
    Duplicate,
}

/// Whether `err` is a UNIQUE/PRIMARY KEY/CHECK style constraint failure.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
