//! Finalize: validation, content audit of new photos, DRAFT → PENDING.
//!
//! Per task result the audit state moves as
//!
//! ```text
//!   UNAUDITED ─┐
//!              ├─ finalize ─▶ AUDIT_PENDING ─▶ FLAGGED ─ manager ─▶ OVERRIDDEN
//!   CLEAR ─────┘                            └▶ CLEAR
//! ```
//!
//! A failing auditor yields CLEAR with an "auditor unavailable" reason.

use super::photo::from_data_url;
use crate::errors::{AppError, AppResult};
use crate::models::submission::Submission;
use crate::models::task_result::{AuditState, PhotoData, TaskResult};
use crate::models::template::ChecklistTemplate;
use crate::remote::{AuditError, ContentAuditor, PhotoStorage};
use chrono::NaiveDateTime;
use futures::future::join_all;
use std::sync::Arc;

/// Outcome of the pre-finalize validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeCheck {
    Ready,
    /// Some tasks are not done; the user may still proceed after confirming.
    NeedsConfirmation { incomplete: Vec<String> },
    /// Required photos are missing: finalize must not proceed.
    Blocked { missing: Vec<String> },
}

/// Validate `results` against `template` (task titles are reported).
pub fn check(template: &ChecklistTemplate, results: &[TaskResult]) -> FinalizeCheck {
    let mut missing = Vec::new();
    let mut incomplete = Vec::new();

    for task in &template.tasks {
        let result = results.iter().find(|r| r.task_id == task.id);
        let photos = result.map(TaskResult::photo_count).unwrap_or(0);
        if task.needs_photos() && photos < task.required_photos as usize {
            missing.push(format!(
                "{} ({}/{})",
                task.title, photos, task.required_photos
            ));
            continue;
        }

        let done = result.is_some_and(|r| r.completed);
        let value_ok = !task.requires_value
            || result
                .and_then(|r| r.value.as_deref())
                .is_some_and(|v| !v.trim().is_empty());
        if !done || !value_ok {
            incomplete.push(task.title.clone());
        }
    }

    if !missing.is_empty() {
        FinalizeCheck::Blocked { missing }
    } else if !incomplete.is_empty() {
        FinalizeCheck::NeedsConfirmation { incomplete }
    } else {
        FinalizeCheck::Ready
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizeReport {
    /// Task ids that went through the audit step.
    pub audited: Vec<String>,
    /// Task ids the auditor flagged.
    pub flagged: Vec<String>,
    /// Task ids cleared because the auditor could not be reached.
    pub auditor_unavailable: Vec<String>,
}

enum Verdict {
    Flagged(String),
    Clear(String),
    Unavailable(String),
}

struct AuditJob {
    index: usize,
    label: String,
    photos: Vec<(usize, PhotoData)>,
}

pub struct FinalizeCoordinator {
    auditor: Arc<dyn ContentAuditor>,
    storage: Arc<dyn PhotoStorage>,
}

impl FinalizeCoordinator {
    pub fn new(auditor: Arc<dyn ContentAuditor>, storage: Arc<dyn PhotoStorage>) -> Self {
        Self { auditor, storage }
    }

    /// Validate, audit and mark `submission` PENDING.
    ///
    /// Nothing is mutated when validation fails.
    pub async fn finalize(
        &self,
        submission: &mut Submission,
        template: &ChecklistTemplate,
        confirmed: bool,
        user: &str,
        now: NaiveDateTime,
    ) -> AppResult<FinalizeReport> {
        match check(template, &submission.task_results) {
            FinalizeCheck::Blocked { missing } => {
                return Err(AppError::FinalizeBlocked { missing });
            }
            FinalizeCheck::NeedsConfirmation { incomplete } if !confirmed => {
                return Err(AppError::ConfirmationRequired { incomplete });
            }
            _ => {}
        }

        let next = submission.status.finalize()?;
        let report = self.audit(template, &mut submission.task_results).await;

        submission.status = next;
        submission.submitted_at = Some(now);
        submission.submitted_by = Some(user.to_string());

        log::info!(
            "finalized submission {} ({} audited, {} flagged)",
            submission.id,
            report.audited.len(),
            report.flagged.len()
        );
        Ok(report)
    }

    /// Audit every result holding photos not yet audited, concurrently
    /// across tasks, and fold the verdicts back into the results.
    pub async fn audit(
        &self,
        template: &ChecklistTemplate,
        results: &mut [TaskResult],
    ) -> FinalizeReport {
        let mut jobs = Vec::new();
        for (index, result) in results.iter_mut().enumerate() {
            if result.photos.is_empty() || !result.has_unaudited_photos() || !result.audit.can_begin()
            {
                continue;
            }
            result.audit = AuditState::AuditPending;
            let label = template
                .task(&result.task_id)
                .map(|t| t.title.clone())
                .unwrap_or_else(|| result.task_id.clone());
            let photos = result
                .photos
                .iter()
                .enumerate()
                .filter(|(_, p)| !p.audited)
                .map(|(i, p)| (i, p.data.clone()))
                .collect();
            jobs.push(AuditJob {
                index,
                label,
                photos,
            });
        }

        let verdicts = join_all(jobs.iter().map(|job| self.audit_task(job))).await;

        let mut report = FinalizeReport::default();
        for (job, (verdict, checked)) in jobs.iter().zip(verdicts) {
            let result = &mut results[job.index];
            for i in checked {
                if let Some(p) = result.photos.get_mut(i) {
                    p.audited = true;
                }
            }
            report.audited.push(result.task_id.clone());
            result.audit = match verdict {
                Verdict::Flagged(reason) => {
                    report.flagged.push(result.task_id.clone());
                    AuditState::Flagged { reason }
                }
                Verdict::Clear(reason) => AuditState::Clear { reason },
                Verdict::Unavailable(reason) => {
                    report.auditor_unavailable.push(result.task_id.clone());
                    AuditState::Clear { reason }
                }
            };
        }
        report
    }

    /// Verdict for the task plus the indices of the photos the auditor answered for.
    async fn audit_task(&self, job: &AuditJob) -> (Verdict, Vec<usize>) {
        let mut last_reason = String::new();
        let mut checked = Vec::with_capacity(job.photos.len());
        for (i, data) in &job.photos {
            let outcome = match self.load(data).await {
                Ok(jpeg) => self.auditor.audit(&jpeg, &job.label).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(v) if v.flagged => {
                    checked.push(*i);
                    return (Verdict::Flagged(v.reason), checked);
                }
                Ok(v) => {
                    checked.push(*i);
                    last_reason = v.reason;
                }
                Err(e) => {
                    log::warn!("audit of '{}' failed, treating as clear: {e}", job.label);
                    return (
                        Verdict::Unavailable(format!("auditor unavailable: {e}")),
                        checked,
                    );
                }
            }
        }
        (Verdict::Clear(last_reason), checked)
    }

    async fn load(&self, data: &PhotoData) -> Result<Vec<u8>, AuditError> {
        match data {
            PhotoData::Inline { data_url } => from_data_url(data_url)
                .ok_or_else(|| AuditError::Malformed("inline photo is not a JPEG data URL".into())),
            PhotoData::Stored { reference, .. } => self
                .storage
                .fetch(reference)
                .await
                .map_err(|e| AuditError::Unreachable(e.to_string())),
        }
    }
}

/// Manager action: FLAGGED → OVERRIDDEN, keeping the original reason.
pub fn override_flag(result: &mut TaskResult, manager: &str, at: NaiveDateTime) -> AppResult<()> {
    match &result.audit {
        AuditState::Flagged { reason } => {
            result.audit = AuditState::Overridden {
                reason: reason.clone(),
                by: manager.to_string(),
                at,
            };
            Ok(())
        }
        _ => Err(AppError::NotFlagged(result.task_id.clone())),
    }
}
