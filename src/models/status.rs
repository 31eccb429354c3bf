use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Lifecycle of a submission.
///
/// Only `Draft` is editable. The legal moves are:
/// - `Draft → Pending` (finalize)
/// - `Pending | Approved | Rejected → Approved | Rejected` (manager review)
///
/// Nothing ever goes back to `Draft`: a manager "reopen" deletes the
/// finalized record and a fresh draft is created on the next edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "DRAFT",
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::Approved => "APPROVED",
            SubmissionStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(SubmissionStatus::Draft),
            "PENDING" => Some(SubmissionStatus::Pending),
            "APPROVED" => Some(SubmissionStatus::Approved),
            "REJECTED" => Some(SubmissionStatus::Rejected),
            _ => None,
        }
    }

    /// Anything other than a draft is finalized.
    pub fn is_finalized(&self) -> bool {
        !matches!(self, SubmissionStatus::Draft)
    }

    pub fn finalize(self) -> AppResult<Self> {
        match self {
            SubmissionStatus::Draft => Ok(SubmissionStatus::Pending),
            other => Err(illegal(other, SubmissionStatus::Pending)),
        }
    }

    pub fn review(self, approve: bool) -> AppResult<Self> {
        let target = if approve {
            SubmissionStatus::Approved
        } else {
            SubmissionStatus::Rejected
        };
        match self {
            SubmissionStatus::Draft => Err(illegal(self, target)),
            SubmissionStatus::Pending | SubmissionStatus::Approved | SubmissionStatus::Rejected => {
                Ok(target)
            }
        }
    }
}

fn illegal(from: SubmissionStatus, to: SubmissionStatus) -> AppError {
    AppError::IllegalTransition {
        from: from.to_db_str().to_string(),
        to: to.to_db_str().to_string(),
    }
}
