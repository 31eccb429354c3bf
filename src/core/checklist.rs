//! Wiring of the sync engine from the user configuration.

use super::clock::{Clock, SystemClock};
use super::finalize::FinalizeCoordinator;
use super::photo::{PhotoCaptureUploader, PhotoSettings};
use super::scheduler::SyncScheduler;
use super::session::{ChecklistSession, Operator, SessionSettings};
use crate::config::Config;
use crate::db::log::ttlog;
use crate::db::store::SqliteStore;
use crate::errors::{AppError, AppResult};
use crate::remote::auditor::{CommandAuditor, NoopAuditor};
use crate::remote::camera::FileCamera;
use crate::remote::fs_storage::FsPhotoStorage;
use crate::remote::{ContentAuditor, PhotoStorage, RemoteStore};
use crate::utils::path::expand_tilde;
use chrono::TimeDelta;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub struct ChecklistLogic {
    store: Arc<SqliteStore>,
    operator: Operator,
    settings: SessionSettings,
    clock: Arc<dyn Clock>,
}

impl ChecklistLogic {
    pub fn from_config(cfg: &Config) -> AppResult<Self> {
        let store = SqliteStore::open(&cfg.database)?;
        Ok(Self::with_store(cfg, Arc::new(store), Arc::new(SystemClock)))
    }

    pub fn with_store(cfg: &Config, store: Arc<SqliteStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            operator: Operator {
                store_id: cfg.store_id.clone(),
                user_id: cfg.user_id.clone(),
                role: cfg.role,
            },
            settings: Self::session_settings(cfg),
            clock,
        }
    }

    pub fn session_settings(cfg: &Config) -> SessionSettings {
        SessionSettings {
            interaction_grace: TimeDelta::milliseconds(cfg.interaction_grace_ms),
            submission_guard: TimeDelta::milliseconds(cfg.submission_guard_ms),
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn store(&self) -> Arc<dyn RemoteStore> {
        Arc::clone(&self.store) as Arc<dyn RemoteStore>
    }

    /// Open the checklist `template_ref` (id or name) and load its state.
    pub async fn open(&self, template_ref: &str) -> AppResult<ChecklistSession> {
        let mut session = ChecklistSession::open(
            template_ref,
            self.operator.clone(),
            self.store(),
            Arc::clone(&self.clock),
            self.settings,
        )
        .await?;
        session.refresh().await?;
        Ok(session)
    }

    /// Open the checklist a submission belongs to.
    pub async fn open_for_submission(&self, submission_id: &str) -> AppResult<ChecklistSession> {
        let all = self
            .store
            .fetch_submissions(&self.operator.store_id)
            .await?;
        let sub = all
            .iter()
            .find(|s| s.id == submission_id)
            .ok_or_else(|| AppError::UnknownSubmission(submission_id.to_string()))?;
        self.open(&sub.template_id).await
    }

    fn photo_storage(cfg: &Config) -> Arc<dyn PhotoStorage> {
        let root = cfg.photo_root.as_deref().map(expand_tilde);
        Arc::new(FsPhotoStorage::new(root))
    }

    /// Uploader whose camera reads `image`.
    pub fn uploader(cfg: &Config, image: &Path) -> PhotoCaptureUploader {
        PhotoCaptureUploader::new(
            Arc::new(FileCamera::new(image)),
            Self::photo_storage(cfg),
            PhotoSettings {
                max_edge: cfg.photo_max_edge,
                quality: cfg.photo_quality,
            },
        )
    }

    pub fn coordinator(cfg: &Config) -> FinalizeCoordinator {
        let timeout = Duration::from_secs(cfg.audit_timeout_secs);
        let auditor: Arc<dyn ContentAuditor> = match cfg
            .audit_command
            .as_deref()
            .and_then(|c| CommandAuditor::from_command_line(c, timeout))
        {
            Some(cmd) => Arc::new(cmd),
            None => Arc::new(NoopAuditor),
        };
        FinalizeCoordinator::new(auditor, Self::photo_storage(cfg))
    }

    pub fn scheduler(cfg: &Config) -> SyncScheduler {
        SyncScheduler::new(Duration::from_secs(cfg.heartbeat_secs.max(1)))
    }

    /// Write an internal log line (non blocking: failures are only reported).
    pub fn record(&self, operation: &str, target: &str, message: &str) {
        if let Err(e) = self.store.with_conn(|conn| ttlog(conn, operation, target, message)) {
            log::warn!("failed to write internal log: {e}");
        }
    }
}
