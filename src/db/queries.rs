//! Row-level access to the `templates` and `submissions` tables.
//!
//! Each row keeps the whole record as JSON in `payload`; the other columns
//! are denormalized copies used for filtering and for the single-draft index.

use crate::errors::AppResult;
use crate::models::submission::Submission;
use crate::models::template::ChecklistTemplate;
use rusqlite::types::Type;
use rusqlite::{Connection, Result, Row, params};

fn json_column<T: serde::de::DeserializeOwned>(row: &Row, column: &str) -> Result<T> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

pub fn map_submission(row: &Row) -> Result<Submission> {
    json_column(row, "payload")
}

pub fn map_template(row: &Row) -> Result<ChecklistTemplate> {
    json_column(row, "payload")
}

/// All submissions of a store, in insertion order.
pub fn load_submissions(conn: &Connection, store_id: &str) -> AppResult<Vec<Submission>> {
    let mut stmt = conn.prepare_cached(
        "SELECT payload FROM submissions
         WHERE store_id = ?1
         ORDER BY rowid ASC",
    )?;

    let rows = stmt.query_map([store_id], map_submission)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn upsert_submission(conn: &Connection, sub: &Submission) -> AppResult<()> {
    let payload = serde_json::to_string(sub)?;
    conn.execute(
        "INSERT INTO submissions (id, template_id, store_id, date, status, submitted_at, payload)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            template_id  = excluded.template_id,
            store_id     = excluded.store_id,
            date         = excluded.date,
            status       = excluded.status,
            submitted_at = excluded.submitted_at,
            payload      = excluded.payload",
        params![
            sub.id,
            sub.template_id,
            sub.store_id,
            sub.date_str(),
            sub.status.to_db_str(),
            sub.submitted_at
                .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
            payload,
        ],
    )?;
    Ok(())
}

pub fn delete_submissions_of_store(conn: &Connection, store_id: &str) -> Result<usize> {
    conn.execute("DELETE FROM submissions WHERE store_id = ?1", [store_id])
}

pub fn load_templates(conn: &Connection, store_id: &str) -> AppResult<Vec<ChecklistTemplate>> {
    let mut stmt = conn.prepare_cached(
        "SELECT payload FROM templates
         WHERE store_id = ?1
         ORDER BY rowid ASC",
    )?;

    let rows = stmt.query_map([store_id], map_template)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn upsert_template(conn: &Connection, template: &ChecklistTemplate) -> AppResult<()> {
    let payload = serde_json::to_string(template)?;
    conn.execute(
        "INSERT INTO templates (id, store_id, payload)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
            store_id = excluded.store_id,
            payload  = excluded.payload",
        params![template.id, template.store_id, payload],
    )?;
    Ok(())
}
