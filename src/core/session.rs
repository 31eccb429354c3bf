//! One device viewing one checklist.
//!
//! ```text
//!   remote snapshot ──▶ resolve ──▶ merge ──▶ in-memory task results ──▶ view
//!   local edit ──▶ lease + optimistic state ──▶ put (fire-and-forget) ──▶ next refresh confirms
//! ```
//!
//! The session owns the lease table, the submission guard and the in-memory
//! results. Writes to the remote store are spawned and never awaited by the
//! edit itself; `flush` exists for process teardown.

use super::clock::{Clock, target_date, unlock_instant};
use super::finalize::{self, FinalizeCoordinator, FinalizeReport};
use super::lease::{LeaseStore, SubmissionGuard};
use super::merger::{MergeOutcome, ResponseMap, ResponseMerger};
use super::photo::{self, CommitOutcome, PhotoCaptureUploader, PhotoTarget};
use super::resolver::resolve;
use crate::errors::{AppError, AppResult};
use crate::models::role::Role;
use crate::models::status::SubmissionStatus;
use crate::models::submission::Submission;
use crate::models::task_result::TaskResult;
use crate::models::template::{ChecklistTemplate, TaskDefinition};
use crate::remote::RemoteStore;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Who is using the session.
#[derive(Debug, Clone)]
pub struct Operator {
    pub store_id: String,
    pub user_id: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Task-level lease window.
    pub interaction_grace: TimeDelta,
    /// Submission-level guard window after finalize / reopen.
    pub submission_guard: TimeDelta,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            interaction_grace: TimeDelta::milliseconds(6_000),
            submission_guard: TimeDelta::milliseconds(7_000),
        }
    }
}

/// Payload of a local mutation, as handed up by the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub submission_id: Option<String>,
    pub template_id: String,
    pub task_responses: Vec<TaskResult>,
    pub is_final: bool,
    pub target_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Submission guard active: the shown submission was left alone.
    Guarded,
    /// Our submission vanished from the snapshot but a lease is live.
    Held,
    /// Nothing to show remotely; local state was cleared.
    Cleared,
    /// No submission before or after.
    Empty,
    /// Snapshot identical to the last merge.
    Unchanged,
    Merged { switched: bool },
}

#[derive(Debug, Clone)]
pub struct TaskView {
    pub task: TaskDefinition,
    pub result: Option<TaskResult>,
    pub leased: bool,
}

/// Snapshot of what the device shows.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub template_id: String,
    pub template_name: String,
    pub target_date: NaiveDate,
    pub submission_id: Option<String>,
    pub status: Option<SubmissionStatus>,
    pub is_read_only: bool,
    pub locked_until: Option<NaiveDateTime>,
    pub tasks: Vec<TaskView>,
}

pub struct ChecklistSession {
    template: ChecklistTemplate,
    operator: Operator,
    store: Arc<dyn RemoteStore>,
    clock: Arc<dyn Clock>,
    leases: LeaseStore,
    guard: SubmissionGuard,
    merger: ResponseMerger,
    current: Option<Submission>,
    responses: ResponseMap,
    read_only: bool,
    locked_until: Option<NaiveDateTime>,
    target_date: NaiveDate,
    known: Vec<Submission>,
    pending: Vec<JoinHandle<()>>,
    last_update: Option<UpdateRequest>,
}

impl ChecklistSession {
    pub fn new(
        template: ChecklistTemplate,
        operator: Operator,
        store: Arc<dyn RemoteStore>,
        clock: Arc<dyn Clock>,
        settings: SessionSettings,
    ) -> Self {
        let target = target_date(clock.now(), &template);
        Self {
            leases: LeaseStore::new(Arc::clone(&clock), settings.interaction_grace),
            guard: SubmissionGuard::new(Arc::clone(&clock), settings.submission_guard),
            merger: ResponseMerger::new(),
            template,
            operator,
            store,
            clock,
            current: None,
            responses: ResponseMap::new(),
            read_only: false,
            locked_until: None,
            target_date: target,
            known: Vec::new(),
            pending: Vec::new(),
            last_update: None,
        }
    }

    /// Look the template up by id (or, failing that, by name) and build a session.
    pub async fn open(
        template_ref: &str,
        operator: Operator,
        store: Arc<dyn RemoteStore>,
        clock: Arc<dyn Clock>,
        settings: SessionSettings,
    ) -> AppResult<Self> {
        let templates = store.fetch_templates(&operator.store_id).await?;
        let template = templates
            .iter()
            .find(|t| t.id == template_ref)
            .or_else(|| {
                templates
                    .iter()
                    .find(|t| t.name.eq_ignore_ascii_case(template_ref))
            })
            .cloned()
            .ok_or_else(|| AppError::UnknownTemplate(template_ref.to_string()))?;
        Ok(Self::new(template, operator, store, clock, settings))
    }

    pub fn template(&self) -> &ChecklistTemplate {
        &self.template
    }

    pub fn leases(&self) -> &LeaseStore {
        &self.leases
    }

    pub fn current(&self) -> Option<&Submission> {
        self.current.as_ref()
    }

    pub fn responses(&self) -> &ResponseMap {
        &self.responses
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn last_update(&self) -> Option<&UpdateRequest> {
        self.last_update.as_ref()
    }

    pub fn store(&self) -> Arc<dyn RemoteStore> {
        Arc::clone(&self.store)
    }

    // ------------------------------------------------------------------
    // Remote → local
    // ------------------------------------------------------------------

    /// Fetch the remote snapshot and reconcile it with local state.
    pub async fn refresh(&mut self) -> AppResult<RefreshOutcome> {
        let all = self.store.fetch_submissions(&self.operator.store_id).await?;
        self.known = all;
        self.leases.prune();

        let now = self.clock.now();
        self.target_date = target_date(now, &self.template);

        if let Some(id) = self.guard.guarded() {
            log::debug!("submission guard active for {id}, skipping resolve");
            return Ok(RefreshOutcome::Guarded);
        }

        let template_tasks_leased = self.leases.any_live(self.template.task_ids());

        // Our submission is missing from the snapshot (write in flight, or a
        // short read): hold steady while someone is still typing.
        if let Some(cur) = &self.current
            && !self.known.iter().any(|s| s.id == cur.id)
            && template_tasks_leased
        {
            log::debug!("submission {} not in snapshot, holding local state", cur.id);
            return Ok(RefreshOutcome::Held);
        }

        let resolution = resolve(&self.known, &self.template, now);

        let Some(incoming) = resolution.submission else {
            if self.current.is_none() {
                return Ok(RefreshOutcome::Empty);
            }
            self.clear_local();
            return Ok(RefreshOutcome::Cleared);
        };

        let switched = self.current.as_ref().map(|c| c.id.as_str()) != Some(incoming.id.as_str());
        if switched {
            self.responses.clear();
            self.merger.invalidate();
        }

        let outcome = self
            .merger
            .merge(&mut self.responses, &incoming, &self.leases);

        self.read_only = resolution.is_read_only;
        self.locked_until = resolution.unlock_at;
        self.current = Some(incoming);

        Ok(match outcome {
            MergeOutcome::Unchanged if !switched => RefreshOutcome::Unchanged,
            _ => RefreshOutcome::Merged { switched },
        })
    }

    fn clear_local(&mut self) {
        self.current = None;
        self.responses.clear();
        self.read_only = false;
        self.locked_until = None;
        self.merger.invalidate();
    }

    // ------------------------------------------------------------------
    // Local → remote
    // ------------------------------------------------------------------

    /// Apply a local mutation optimistically and push it.
    pub fn on_update(&mut self, update: UpdateRequest) -> AppResult<()> {
        if update.template_id != self.template.id {
            return Err(AppError::UnknownTemplate(update.template_id));
        }
        if update.is_final {
            return Err(AppError::FinalUpdateRejected);
        }
        self.ensure_editable()?;

        let now = self.clock.now();
        let needs_new = match (&self.current, &update.submission_id) {
            (None, None) => true,
            (Some(cur), None) => cur.is_finalized(),
            (Some(cur), Some(id)) if cur.id == *id => cur.is_finalized(),
            (_, Some(id)) => return Err(AppError::UnknownSubmission(id.clone())),
        };
        if needs_new {
            let draft =
                Submission::new_draft(&self.template.id, &self.operator.store_id, update.target_date);
            log::info!("created draft {} for {}", draft.id, draft.date_str());
            self.responses.clear();
            self.current = Some(draft);
        }

        for result in &update.task_responses {
            self.leases.mark_interaction(&result.task_id);
            self.responses
                .insert(result.task_id.clone(), result.clone());
        }
        self.merger.invalidate();

        let snapshot = self.snapshot()?;
        log::debug!(
            "update on {} ({} tasks, final={}) at {}",
            snapshot.id,
            update.task_responses.len(),
            update.is_final,
            now
        );
        self.last_update = Some(UpdateRequest {
            submission_id: Some(snapshot.id.clone()),
            ..update
        });
        self.spawn_put(snapshot);
        Ok(())
    }

    pub fn toggle_task(&mut self, task_id: &str, completed: bool) -> AppResult<()> {
        let now = self.clock.now();
        let user = self.operator.user_id.clone();
        let mut result = self.result_for(task_id)?;
        result.set_completed(completed, &user, now);
        self.push_result(result)
    }

    /// Non-empty values complete value-required tasks; clearing un-completes them.
    pub fn set_value(&mut self, task_id: &str, value: &str) -> AppResult<()> {
        let now = self.clock.now();
        let user = self.operator.user_id.clone();
        let requires_value = self.task(task_id)?.requires_value;
        let mut result = self.result_for(task_id)?;

        let trimmed = value.trim();
        result.value = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        if requires_value {
            let filled = result.value.is_some();
            if filled != result.completed {
                result.set_completed(filled, &user, now);
            }
        }
        self.push_result(result)
    }

    pub fn set_comment(&mut self, task_id: &str, comment: &str) -> AppResult<()> {
        let mut result = self.result_for(task_id)?;
        let trimmed = comment.trim();
        result.comment = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self.push_result(result)
    }

    /// Capture a photo for `task_id`, store it and recompute completion.
    pub async fn add_photo(
        &mut self,
        uploader: &PhotoCaptureUploader,
        task_id: &str,
    ) -> AppResult<CommitOutcome> {
        let task = self.task(task_id)?.clone();
        self.ensure_editable()?;

        let raw = uploader.capture(task_id).await?;

        // The draft must exist before the storage path can be computed.
        let mut result = self.result_for(task_id)?;
        self.ensure_draft();
        let (store_id, date, submission_id) = match &self.current {
            Some(cur) => (cur.store_id.clone(), cur.date, cur.id.clone()),
            None => return Err(AppError::Other("draft was not created".into())),
        };

        let target = PhotoTarget {
            store_id: &store_id,
            date,
            submission_id: &submission_id,
            task_id,
            index: result.photo_count() + 1,
        };
        let outcome = uploader.commit(&target, &raw).await?;

        let now = self.clock.now();
        let satisfied = photo::apply_photo(
            &mut result,
            outcome.photo.clone(),
            &task,
            &self.operator.user_id,
            now,
        );
        log::debug!(
            "task {} has {}/{} photos (satisfied={})",
            task_id,
            result.photo_count(),
            task.required_photos,
            satisfied
        );
        self.push_result(result)?;
        Ok(outcome)
    }

    /// Validate, audit and submit the shown draft.
    pub async fn finalize(
        &mut self,
        coordinator: &FinalizeCoordinator,
        confirmed: bool,
    ) -> AppResult<FinalizeReport> {
        self.ensure_editable()?;
        if self.current.is_none() {
            return Err(AppError::NothingToFinalize);
        }

        let mut submission = self.snapshot()?;
        let now = self.clock.now();
        let report = coordinator
            .finalize(
                &mut submission,
                &self.template,
                confirmed,
                &self.operator.user_id,
                now,
            )
            .await?;

        self.responses = submission
            .task_results
            .iter()
            .map(|r| (r.task_id.clone(), r.clone()))
            .collect();
        self.read_only = true;
        self.locked_until = Some(unlock_instant(&submission, &self.template));
        self.guard.arm(&submission.id);
        self.merger.invalidate();

        self.last_update = Some(UpdateRequest {
            submission_id: Some(submission.id.clone()),
            template_id: self.template.id.clone(),
            task_responses: submission.task_results.clone(),
            is_final: true,
            target_date: submission.date,
        });
        self.current = Some(submission.clone());
        self.spawn_put(submission);
        Ok(report)
    }

    /// Manager "reopen": delete a finalized submission and return the
    /// checklist to an editable state.
    pub async fn reset_submission(&mut self, submission_id: &str) -> AppResult<()> {
        self.require_manager("reopen")?;

        let mut all = self.store.fetch_submissions(&self.operator.store_id).await?;
        let before = all.len();
        all.retain(|s| s.id != submission_id);
        if all.len() == before {
            return Err(AppError::UnknownSubmission(submission_id.to_string()));
        }

        self.known = all.clone();
        self.leases.clear();
        self.clear_local();
        self.guard.arm(submission_id);

        let store = Arc::clone(&self.store);
        let store_id = self.operator.store_id.clone();
        let id = submission_id.to_string();
        self.pending.push(tokio::spawn(async move {
            match store.put_submissions_registry(&store_id, &all).await {
                Ok(()) => log::info!("reopened: submission {id} removed"),
                Err(e) => log::warn!("reopen of {id} not written: {e}"),
            }
        }));
        Ok(())
    }

    /// Manager override of a flagged audit on any known submission.
    pub async fn override_flag(&mut self, submission_id: &str, task_id: &str) -> AppResult<()> {
        self.require_manager("override")?;
        let now = self.clock.now();
        let manager = self.operator.user_id.clone();

        let mut sub = self.find_submission(submission_id).await?;
        let result = sub
            .result_mut(task_id)
            .ok_or_else(|| AppError::UnknownTask(task_id.to_string()))?;
        finalize::override_flag(result, &manager, now)?;
        self.adopt_manager_change(sub);
        Ok(())
    }

    /// Manager review of a finalized submission.
    pub async fn review(&mut self, submission_id: &str, approve: bool) -> AppResult<SubmissionStatus> {
        self.require_manager("review")?;
        let mut sub = self.find_submission(submission_id).await?;
        sub.status = sub.status.review(approve)?;
        sub.reviewed_by = Some(self.operator.user_id.clone());
        sub.reviewed_at = Some(self.clock.now());
        let status = sub.status;
        self.adopt_manager_change(sub);
        Ok(status)
    }

    /// Wait for every spawned write. Failures were already logged.
    pub async fn flush(&mut self) {
        for handle in self.pending.drain(..) {
            if let Err(e) = handle.await {
                log::warn!("background write aborted: {e}");
            }
        }
    }

    pub fn view(&self) -> SessionView {
        let tasks = self
            .template
            .tasks
            .iter()
            .map(|t| TaskView {
                task: t.clone(),
                result: self.responses.get(&t.id).cloned(),
                leased: self.leases.is_live(&t.id),
            })
            .collect();
        SessionView {
            template_id: self.template.id.clone(),
            template_name: self.template.name.clone(),
            target_date: self.target_date,
            submission_id: self.current.as_ref().map(|s| s.id.clone()),
            status: self.current.as_ref().map(|s| s.status),
            is_read_only: self.read_only,
            locked_until: self.locked_until,
            tasks,
        }
    }

    // ------------------------------------------------------------------
    // helpers
    // ------------------------------------------------------------------

    fn task(&self, task_id: &str) -> AppResult<&TaskDefinition> {
        self.template
            .task(task_id)
            .ok_or_else(|| AppError::UnknownTask(task_id.to_string()))
    }

    fn result_for(&self, task_id: &str) -> AppResult<TaskResult> {
        self.task(task_id)?;
        Ok(self
            .responses
            .get(task_id)
            .cloned()
            .unwrap_or_else(|| TaskResult::new(task_id)))
    }

    fn ensure_editable(&self) -> AppResult<()> {
        if self.read_only {
            let until = self
                .locked_until
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "review".to_string());
            return Err(AppError::ReadOnly(until));
        }
        Ok(())
    }

    fn ensure_draft(&mut self) {
        if self.current.is_none() {
            let draft = Submission::new_draft(
                &self.template.id,
                &self.operator.store_id,
                self.target_date,
            );
            log::info!("created draft {} for {}", draft.id, draft.date_str());
            self.current = Some(draft);
        }
    }

    fn push_result(&mut self, result: TaskResult) -> AppResult<()> {
        let update = UpdateRequest {
            submission_id: self.current.as_ref().map(|s| s.id.clone()),
            template_id: self.template.id.clone(),
            task_responses: vec![result],
            is_final: false,
            target_date: self
                .current
                .as_ref()
                .map(|s| s.date)
                .unwrap_or(self.target_date),
        };
        self.on_update(update)
    }

    /// Current submission with the in-memory results, in template order.
    fn snapshot(&self) -> AppResult<Submission> {
        let mut sub = self.current.clone().ok_or(AppError::NothingToFinalize)?;
        let mut results: Vec<TaskResult> = self
            .template
            .tasks
            .iter()
            .filter_map(|t| self.responses.get(&t.id).cloned())
            .collect();
        // Results for tasks no longer in the template are kept at the end.
        results.extend(
            self.responses
                .values()
                .filter(|r| self.template.task(&r.task_id).is_none())
                .cloned(),
        );
        sub.task_results = results;
        Ok(sub)
    }

    async fn find_submission(&mut self, submission_id: &str) -> AppResult<Submission> {
        if let Some(sub) = self.known.iter().find(|s| s.id == submission_id) {
            return Ok(sub.clone());
        }
        self.known = self.store.fetch_submissions(&self.operator.store_id).await?;
        self.known
            .iter()
            .find(|s| s.id == submission_id)
            .cloned()
            .ok_or_else(|| AppError::UnknownSubmission(submission_id.to_string()))
    }

    fn adopt_manager_change(&mut self, sub: Submission) {
        if let Some(k) = self.known.iter_mut().find(|s| s.id == sub.id) {
            *k = sub.clone();
        }
        if self.current.as_ref().is_some_and(|c| c.id == sub.id) {
            self.responses = sub
                .task_results
                .iter()
                .map(|r| (r.task_id.clone(), r.clone()))
                .collect();
            self.current = Some(sub.clone());
            self.merger.invalidate();
        }
        self.spawn_put(sub);
    }

    fn require_manager(&self, operation: &str) -> AppResult<()> {
        if self.operator.role.is_manager() {
            Ok(())
        } else {
            Err(AppError::Forbidden(operation.to_string()))
        }
    }

    fn spawn_put(&mut self, submission: Submission) {
        let store = Arc::clone(&self.store);
        self.pending.retain(|h| !h.is_finished());
        self.pending.push(tokio::spawn(async move {
            if let Err(e) = store.put_submission(&submission).await {
                log::warn!("write of submission {} failed: {e}", submission.id);
            }
        }));
    }
}

impl Drop for ChecklistSession {
    fn drop(&mut self) {
        // Leases are process-local; nothing survives the session.
        self.leases.clear();
    }
}
