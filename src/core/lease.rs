//! Interaction leases.
//!
//! A lease says "this task was just edited here, don't let a possibly stale
//! remote value overwrite it". Leases live only in the memory of one viewing
//! session and expire after a grace window, after which the remote store is
//! trusted again.

use super::clock::Clock;
use chrono::{NaiveDateTime, TimeDelta};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-task write leases for one checklist-viewing session.
pub struct LeaseStore {
    clock: Arc<dyn Clock>,
    grace: TimeDelta,
    leases: HashMap<String, NaiveDateTime>,
}

impl LeaseStore {
    pub fn new(clock: Arc<dyn Clock>, grace: TimeDelta) -> Self {
        Self {
            clock,
            grace,
            leases: HashMap::new(),
        }
    }

    pub fn grace(&self) -> TimeDelta {
        self.grace
    }

    /// Record a local write to `task_id` at the current instant.
    pub fn mark_interaction(&mut self, task_id: &str) {
        let now = self.clock.now();
        self.leases.insert(task_id.to_string(), now);
    }

    /// Whether `task_id` was touched less than `grace` ago.
    pub fn is_recently_interacted(&self, task_id: &str, grace: TimeDelta) -> bool {
        match self.leases.get(task_id) {
            Some(at) => self.clock.now() - *at < grace,
            None => false,
        }
    }

    /// Same as [`is_recently_interacted`](Self::is_recently_interacted) with the session grace.
    pub fn is_live(&self, task_id: &str) -> bool {
        self.is_recently_interacted(task_id, self.grace)
    }

    /// True if any of `task_ids` holds a live lease.
    pub fn any_live<'a, I>(&self, task_ids: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        task_ids.into_iter().any(|id| self.is_live(id))
    }

    /// Forget expired leases.
    pub fn prune(&mut self) {
        let now = self.clock.now();
        let grace = self.grace;
        self.leases.retain(|_, at| now - *at < grace);
    }

    pub fn clear(&mut self) {
        self.leases.clear();
    }

    pub fn len(&self) -> usize {
        self.leases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }
}

/// Coarse, submission-level lease.
///
/// Armed right after a finalize or a reopen; while active, background refreshes
/// must not change which submission is shown, since the remote snapshot may
/// predate the write the action triggered.
pub struct SubmissionGuard {
    clock: Arc<dyn Clock>,
    window: TimeDelta,
    armed: Option<(String, NaiveDateTime)>,
}

impl SubmissionGuard {
    pub fn new(clock: Arc<dyn Clock>, window: TimeDelta) -> Self {
        Self {
            clock,
            window,
            armed: None,
        }
    }

    pub fn arm(&mut self, submission_id: &str) {
        self.armed = Some((submission_id.to_string(), self.clock.now()));
    }

    pub fn is_active(&self) -> bool {
        match &self.armed {
            Some((_, at)) => self.clock.now() - *at < self.window,
            None => false,
        }
    }

    /// Submission id the guard protects, while active.
    pub fn guarded(&self) -> Option<&str> {
        if self.is_active() {
            self.armed.as_ref().map(|(id, _)| id.as_str())
        } else {
            None
        }
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }
}
