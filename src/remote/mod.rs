//! Interfaces of the external collaborators the engine talks to.
//!
//! ```text
//!   RemoteStore      fetch/put submissions and templates (shared, polled)
//!   PhotoStorage     upload(jpeg, path) → reference, fetch(reference) → jpeg
//!   ContentAuditor   audit(jpeg, task label) → { flagged, reason }
//!   Camera           capture(task) → raw image bytes
//! ```
//!
//! Every call may fail; callers degrade instead of propagating, except for
//! camera errors which are shown to the user as retryable.

pub mod auditor;
pub mod camera;
pub mod fs_storage;

use crate::models::submission::Submission;
use crate::models::template::ChecklistTemplate;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("conflicting write: {0}")]
    Conflict(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("photo storage not configured")]
    NotConfigured,

    #[error("upload failed: {0}")]
    Failed(String),

    #[error("photo not found: {0}")]
    NotFound(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("auditor unreachable: {0}")]
    Unreachable(String),

    #[error("auditor timed out")]
    Timeout,

    #[error("malformed auditor response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("camera unavailable: {0}")]
    Unavailable(String),

    #[error("capture cancelled")]
    Cancelled,
}

impl CaptureError {
    /// Every capture failure leaves the capture modal open for another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            CaptureError::PermissionDenied(_) | CaptureError::Unavailable(_) => true,
            CaptureError::Cancelled => false,
        }
    }
}

/// Auditor answer for one photo.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuditVerdict {
    pub flagged: bool,
    #[serde(default)]
    pub reason: String,
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch_submissions(&self, store_id: &str) -> Result<Vec<Submission>, StoreError>;

    async fn put_submission(&self, submission: &Submission) -> Result<(), StoreError>;

    /// Replace the whole submission set of `store_id` in one go.
    async fn put_submissions_registry(
        &self,
        store_id: &str,
        submissions: &[Submission],
    ) -> Result<(), StoreError>;

    async fn fetch_templates(&self, store_id: &str) -> Result<Vec<ChecklistTemplate>, StoreError>;

    async fn put_templates(&self, templates: &[ChecklistTemplate]) -> Result<(), StoreError>;

    /// Change notifications for writes made through this handle, if supported.
    fn subscribe(&self) -> Option<watch::Receiver<u64>> {
        None
    }
}

#[async_trait]
pub trait PhotoStorage: Send + Sync {
    async fn upload(&self, jpeg: &[u8], path: &str) -> Result<String, UploadError>;

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, UploadError>;
}

#[async_trait]
pub trait ContentAuditor: Send + Sync {
    async fn audit(&self, jpeg: &[u8], task_label: &str) -> Result<AuditVerdict, AuditError>;
}

#[async_trait]
pub trait Camera: Send + Sync {
    async fn capture(&self, task_id: &str) -> Result<Vec<u8>, CaptureError>;
}
