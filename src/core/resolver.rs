//! Chooses which submission a device shows for a checklist right now.

use super::clock::{finalize_instant, target_date, unlock_instant};
use crate::models::status::SubmissionStatus;
use crate::models::submission::Submission;
use crate::models::template::ChecklistTemplate;
use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// `None` means "no active submission": a draft is created on first edit.
    pub submission: Option<Submission>,
    pub is_locked: bool,
    pub is_read_only: bool,
    pub target_date: NaiveDate,
    /// Set when `is_locked`.
    pub unlock_at: Option<NaiveDateTime>,
}

/// Pick the submission to display for `template` at `now`.
///
/// A finalized submission still inside its lock window always wins, whatever
/// its logical date; only when nothing is locked do we look for today's draft.
pub fn resolve(all: &[Submission], template: &ChecklistTemplate, now: NaiveDateTime) -> Resolution {
    let target = target_date(now, template);

    let mut finalized: Vec<&Submission> = all
        .iter()
        .filter(|s| belongs_to(s, template) && s.is_finalized())
        .collect();
    // Most recent first; the sort is stable so ties keep the received order.
    finalized.sort_by(|a, b| finalize_instant(b).cmp(&finalize_instant(a)));

    for sub in finalized {
        let unlock_at = unlock_instant(sub, template);
        if now < unlock_at {
            return Resolution {
                submission: Some(sub.clone()),
                is_locked: true,
                is_read_only: true,
                target_date: target,
                unlock_at: Some(unlock_at),
            };
        }
    }

    let draft = all.iter().find(|s| {
        belongs_to(s, template) && s.status == SubmissionStatus::Draft && s.date == target
    });

    Resolution {
        submission: draft.cloned(),
        is_locked: false,
        is_read_only: false,
        target_date: target,
        unlock_at: None,
    }
}

fn belongs_to(submission: &Submission, template: &ChecklistTemplate) -> bool {
    submission.template_id == template.id
        && (template.store_id.is_empty() || submission.store_id == template.store_id)
}
