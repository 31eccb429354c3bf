use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Where the bytes of a photo live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhotoData {
    /// Uploaded to blob storage.
    Stored { reference: String, path: String },
    /// Degraded mode: upload failed, JPEG kept as a data URL on the result.
    Inline { data_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef {
    #[serde(flatten)]
    pub data: PhotoData,
    #[serde(default)]
    pub audited: bool,
}

impl PhotoRef {
    pub fn new(data: PhotoData) -> Self {
        Self {
            data,
            audited: false,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.data, PhotoData::Inline { .. })
    }
}

/// Content-audit state of a task result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditState {
    #[default]
    Unaudited,
    AuditPending,
    Flagged {
        reason: String,
    },
    Clear {
        reason: String,
    },
    Overridden {
        reason: String,
        by: String,
        at: NaiveDateTime,
    },
}

impl AuditState {
    /// A flagged result is never audited again; neither is an overridden one.
    pub fn can_begin(&self) -> bool {
        matches!(self, AuditState::Unaudited | AuditState::Clear { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuditState::Unaudited => "UNAUDITED",
            AuditState::AuditPending => "AUDIT_PENDING",
            AuditState::Flagged { .. } => "FLAGGED",
            AuditState::Clear { .. } => "CLEAR",
            AuditState::Overridden { .. } => "OVERRIDDEN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub completed_by: Option<String>,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub audit: AuditState,
}

impl TaskResult {
    pub fn new(task_id: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            completed: false,
            photos: Vec::new(),
            value: None,
            comment: None,
            completed_by: None,
            completed_at: None,
            audit: AuditState::Unaudited,
        }
    }

    /// Record completion (or un-completion) by `user` at `at`.
    pub fn set_completed(&mut self, completed: bool, user: &str, at: NaiveDateTime) {
        self.completed = completed;
        if completed {
            self.completed_by = Some(user.to_string());
            self.completed_at = Some(at);
        } else {
            self.completed_by = None;
            self.completed_at = None;
        }
    }

    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    pub fn has_unaudited_photos(&self) -> bool {
        self.photos.iter().any(|p| !p.audited)
    }

    /// `None` until the audit step has produced a verdict.
    pub fn audit_flagged(&self) -> Option<bool> {
        match &self.audit {
            AuditState::Unaudited | AuditState::AuditPending => None,
            AuditState::Flagged { .. } => Some(true),
            AuditState::Clear { .. } | AuditState::Overridden { .. } => Some(false),
        }
    }

    pub fn audit_reason(&self) -> &str {
        match &self.audit {
            AuditState::Flagged { reason }
            | AuditState::Clear { reason }
            | AuditState::Overridden { reason, .. } => reason,
            _ => "",
        }
    }

    pub fn manager_override(&self) -> Option<bool> {
        match &self.audit {
            AuditState::Overridden { .. } => Some(true),
            AuditState::Flagged { .. } => Some(false),
            _ => None,
        }
    }
}
