//! Wall-clock arithmetic for checklists.
//!
//! Two pure functions drive everything time-related in the engine:
//! - [`target_date`]: which logical day a new submission belongs to "right now";
//! - [`unlock_instant`]: when a finalized submission stops being the locked,
//!   read-only record for its checklist.
//!
//! All instants are local wall-clock `NaiveDateTime`s: staff perceive "today"
//! in local time, so UTC never enters the picture.

use crate::models::checklist_type::ChecklistType;
use crate::models::submission::Submission;
use crate::models::template::ChecklistTemplate;
use chrono::{Datelike, Days, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Weekday};
use regex::Regex;
use std::sync::{Arc, LazyLock, Mutex};

/// Source of "now" for the engine. Leases and lock windows read the same clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Settable clock, shared by clones. Used by tests and replays.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            inner: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: NaiveDateTime) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = at;
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        match self.inner.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

static WEEKDAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
        .expect("weekday regex is valid")
});

/// Weekday named in a free-text checklist name ("Monday Deep Clean" → Monday).
pub fn weekday_in_name(name: &str) -> Option<Weekday> {
    let caps = WEEKDAY_RE.captures(name)?;
    caps.get(1)?.as_str().parse::<Weekday>().ok()
}

/// Weekday a WEEKLY template is pinned to, if its name encodes one.
pub fn encoded_weekday(template: &ChecklistTemplate) -> Option<Weekday> {
    if template.kind.is_weekly() {
        weekday_in_name(&template.name)
    } else {
        None
    }
}

/// Logical day a submission created at `now` belongs to.
pub fn target_date(now: NaiveDateTime, template: &ChecklistTemplate) -> NaiveDate {
    let today = now.date();

    // Before the unlock hour we are still in yesterday's shift.
    if now.hour() < template.unlock_hour {
        return today.pred_opt().unwrap_or(today);
    }

    if let Some(weekday) = encoded_weekday(template) {
        return most_recent(today, weekday);
    }

    today
}

/// Most recent date on or before `from` that falls on `weekday`.
pub fn most_recent(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let back = (7 + from.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    from.checked_sub_days(Days::new(back as u64)).unwrap_or(from)
}

/// Last second of a logical day, used when a finalized submission carries no
/// submission instant.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    midnight_after(date, 1) - TimeDelta::seconds(1)
}

fn midnight_after(date: NaiveDate, days: u64) -> NaiveDateTime {
    date.checked_add_days(Days::new(days))
        .unwrap_or(NaiveDate::MAX)
        .and_time(NaiveTime::MIN)
}

/// Instant after which a finalized submission is no longer the locked record.
///
/// | type                         | unlocks at                  |
/// |------------------------------|-----------------------------|
/// | WEEKLY with a named weekday  | finalize day + 7, midnight  |
/// | CLOSING                      | finalize day + 1, noon      |
/// | everything else              | finalize day + 1, midnight  |
pub fn unlock_instant(submission: &Submission, template: &ChecklistTemplate) -> NaiveDateTime {
    let finalized = finalize_instant(submission);
    let day = finalized.date();

    match template.kind {
        ChecklistType::Weekly if encoded_weekday(template).is_some() => midnight_after(day, 7),
        ChecklistType::Closing => midnight_after(day, 1) + TimeDelta::hours(12),
        _ => midnight_after(day, 1),
    }
}

/// When the submission was finalized, falling back to the end of its logical day.
pub fn finalize_instant(submission: &Submission) -> NaiveDateTime {
    submission
        .submitted_at
        .unwrap_or_else(|| end_of_day(submission.date))
}

/// True while `now` is inside the lock window of a finalized submission.
pub fn is_locked(submission: &Submission, template: &ChecklistTemplate, now: NaiveDateTime) -> bool {
    submission.is_finalized() && now < unlock_instant(submission, template)
}
