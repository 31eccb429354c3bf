use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, Result};

/// Ensure that the `log` table exists. Applied migrations are recorded there.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

/// Run `sql` once, inside a transaction, and mark `version` as applied.
fn apply_once(conn: &Connection, version: &str, description: &str, sql: &str) -> Result<()> {
    if is_applied(conn, version)? {
        return Ok(());
    }

    conn.execute_batch(&format!("BEGIN;\n{sql}\nCOMMIT;"))
        .inspect_err(|_| {
            let _ = conn.execute_batch("ROLLBACK;");
        })?;

    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [version, description],
    )?;

    success(format!("Migration applied: {} → {}", version, description));
    Ok(())
}

const CREATE_CHECKLIST_TABLES: &str = r#"
    CREATE TABLE IF NOT EXISTS templates (
        id        TEXT PRIMARY KEY,
        store_id  TEXT NOT NULL,
        payload   TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS submissions (
        id            TEXT PRIMARY KEY,
        template_id   TEXT NOT NULL,
        store_id      TEXT NOT NULL,
        date          TEXT NOT NULL,
        status        TEXT NOT NULL CHECK(status IN ('DRAFT','PENDING','APPROVED','REJECTED')),
        submitted_at  TEXT,
        payload       TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_submissions_store ON submissions(store_id);
    CREATE INDEX IF NOT EXISTS idx_submissions_template_date ON submissions(template_id, date);
"#;

// At most one DRAFT per (template, store, date).
const SINGLE_DRAFT_INDEX: &str = r#"
    CREATE UNIQUE INDEX IF NOT EXISTS uq_submissions_single_draft
        ON submissions(template_id, store_id, date)
        WHERE status = 'DRAFT';
"#;

/// Public entry point: run all pending migrations.
///
/// Invoked by db::initialize::init_db().
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    ensure_log_table(conn)?;

    apply_once(
        conn,
        "20261001_0001_create_checklist_tables",
        "created templates and submissions tables",
        CREATE_CHECKLIST_TABLES,
    )?;

    apply_once(
        conn,
        "20261001_0002_single_draft_index",
        "enforced a single draft per template, store and date",
        SINGLE_DRAFT_INDEX,
    )?;

    Ok(())
}
