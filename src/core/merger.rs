//! Reconciles an incoming remote snapshot with the in-memory task results.

use super::lease::LeaseStore;
use crate::models::submission::Submission;
use crate::models::task_result::TaskResult;
use std::collections::BTreeMap;

/// In-memory task results of the shown submission, keyed by task id.
pub type ResponseMap = BTreeMap<String, TaskResult>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Same fingerprint as the previous merge: nothing touched.
    Unchanged,
    Merged {
        /// Tasks whose local value survived because of a live lease.
        kept_local: Vec<String>,
        /// Tasks whose value now comes from the remote snapshot.
        replaced: usize,
    },
}

/// Cheap structural fingerprint: submission id and status, then per task the
/// id, completed flag and completer.
pub fn fingerprint(submission: &Submission) -> String {
    let mut out = format!("{}:{}", submission.id, submission.status.to_db_str());
    for r in &submission.task_results {
        out.push('|');
        out.push_str(&r.task_id);
        out.push(':');
        out.push(if r.completed { '1' } else { '0' });
        out.push(':');
        out.push_str(r.completed_by.as_deref().unwrap_or(""));
    }
    out
}

#[derive(Debug, Default)]
pub struct ResponseMerger {
    last_fingerprint: Option<String>,
}

impl ResponseMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the last fingerprint; the next merge always runs.
    ///
    /// Needed whenever the in-memory map stops mirroring the last merged
    /// snapshot (a local edit, a switch of submission).
    pub fn invalidate(&mut self) {
        self.last_fingerprint = None;
    }

    pub fn merge(
        &mut self,
        current: &mut ResponseMap,
        incoming: &Submission,
        leases: &LeaseStore,
    ) -> MergeOutcome {
        let fp = fingerprint(incoming);
        if self.last_fingerprint.as_deref() == Some(fp.as_str()) {
            return MergeOutcome::Unchanged;
        }

        let mut next = ResponseMap::new();
        let mut kept_local = Vec::new();
        let mut replaced = 0;

        for remote in &incoming.task_results {
            let leased_local = current
                .get(&remote.task_id)
                .filter(|_| leases.is_live(&remote.task_id));
            if let Some(local) = leased_local {
                next.insert(remote.task_id.clone(), local.clone());
                kept_local.push(remote.task_id.clone());
            } else {
                next.insert(remote.task_id.clone(), remote.clone());
                replaced += 1;
            }
        }

        // Local-only entries survive only while leased (write still in flight).
        for (task_id, local) in current.iter() {
            if !next.contains_key(task_id) && leases.is_live(task_id) {
                next.insert(task_id.clone(), local.clone());
                if !kept_local.contains(task_id) {
                    kept_local.push(task_id.clone());
                }
            }
        }

        *current = next;

        // A partial merge leaves the map diverging from the snapshot, so the
        // same snapshot must be merged again once the leases have expired.
        self.last_fingerprint = if kept_local.is_empty() { Some(fp) } else { None };

        log::debug!(
            "merged submission {}: {} replaced, {} kept local",
            incoming.id,
            replaced,
            kept_local.len()
        );

        MergeOutcome::Merged {
            kept_local,
            replaced,
        }
    }
}
