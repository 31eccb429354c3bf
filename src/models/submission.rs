use super::status::SubmissionStatus;
use super::task_result::TaskResult;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub template_id: String,
    pub store_id: String,
    /// Logical day the checklist belongs to (not when it was submitted).
    pub date: NaiveDate,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub submitted_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub submitted_by: Option<String>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub task_results: Vec<TaskResult>,
}

impl Submission {
    pub fn new_draft(template_id: &str, store_id: &str, date: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            template_id: template_id.to_string(),
            store_id: store_id.to_string(),
            date,
            status: SubmissionStatus::Draft,
            submitted_at: None,
            submitted_by: None,
            reviewed_by: None,
            reviewed_at: None,
            task_results: Vec::new(),
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.status.is_finalized()
    }

    pub fn date_str(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn result(&self, task_id: &str) -> Option<&TaskResult> {
        self.task_results.iter().find(|r| r.task_id == task_id)
    }

    pub fn result_mut(&mut self, task_id: &str) -> Option<&mut TaskResult> {
        self.task_results.iter_mut().find(|r| r.task_id == task_id)
    }
}
