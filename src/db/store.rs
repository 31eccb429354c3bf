//! SQLite-backed `RemoteStore`.
//!
//! Every device (process) opens the same database file; the file is the
//! shared store. Writes made through one handle bump a counter that
//! subscribers observe as a storage-change notification.

use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::submission::Submission;
use crate::models::template::ChecklistTemplate;
use crate::remote::{RemoteStore, StoreError};
use async_trait::async_trait;
use rusqlite::{Connection, ErrorCode};
use std::sync::Mutex;
use tokio::sync::watch;

pub struct SqliteStore {
    pool: Mutex<DbPool>,
    changes: watch::Sender<u64>,
}

fn store_error(e: AppError) -> StoreError {
    match e {
        AppError::Db(rusqlite::Error::SqliteFailure(err, msg))
            if err.code == ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict(msg.unwrap_or_else(|| err.to_string()))
        }
        AppError::Db(rusqlite::Error::FromSqlConversionFailure(_, _, inner)) => {
            StoreError::Corrupt(inner.to_string())
        }
        AppError::Serialization(inner) => StoreError::Corrupt(inner.to_string()),
        other => StoreError::Unavailable(other.to_string()),
    }
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Result<Self, AppError> {
        init_db(&pool.conn)?;
        let (changes, _) = watch::channel(0);
        Ok(Self {
            pool: Mutex::new(pool),
            changes,
        })
    }

    /// Open (and migrate) the database file at `path`.
    pub fn open(path: &str) -> Result<Self, AppError> {
        Self::new(DbPool::new(path)?)
    }

    pub fn in_memory() -> Result<Self, AppError> {
        Self::new(DbPool::in_memory()?)
    }

    /// Run `f` against the underlying connection.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, AppError>,
    ) -> Result<T, StoreError> {
        let mut pool = self
            .pool
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".into()))?;
        f(&mut pool.conn).map_err(store_error)
    }

    fn notify(&self) {
        self.changes.send_modify(|v| *v = v.wrapping_add(1));
    }
}

#[async_trait]
impl RemoteStore for SqliteStore {
    async fn fetch_submissions(&self, store_id: &str) -> Result<Vec<Submission>, StoreError> {
        self.with_conn(|conn| queries::load_submissions(conn, store_id))
    }

    async fn put_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        self.with_conn(|conn| queries::upsert_submission(conn, submission))?;
        self.notify();
        Ok(())
    }

    async fn put_submissions_registry(
        &self,
        store_id: &str,
        submissions: &[Submission],
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            queries::delete_submissions_of_store(&tx, store_id)?;
            for sub in submissions.iter().filter(|s| s.store_id == store_id) {
                queries::upsert_submission(&tx, sub)?;
            }
            tx.commit()?;
            Ok(())
        })?;
        self.notify();
        Ok(())
    }

    async fn fetch_templates(&self, store_id: &str) -> Result<Vec<ChecklistTemplate>, StoreError> {
        self.with_conn(|conn| queries::load_templates(conn, store_id))
    }

    async fn put_templates(&self, templates: &[ChecklistTemplate]) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            for t in templates {
                queries::upsert_template(&tx, t)?;
            }
            tx.commit()?;
            Ok(())
        })?;
        self.notify();
        Ok(())
    }

    fn subscribe(&self) -> Option<watch::Receiver<u64>> {
        Some(self.changes.subscribe())
    }
}
