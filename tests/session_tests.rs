use chrono::TimeDelta;
use rchecklist::core::clock::ManualClock;
use rchecklist::core::finalize::FinalizeCoordinator;
use rchecklist::core::photo::{PhotoCaptureUploader, PhotoSettings};
use rchecklist::core::session::{
    ChecklistSession, Operator, RefreshOutcome, SessionSettings, UpdateRequest,
};
use rchecklist::errors::AppError;
use rchecklist::models::checklist_type::ChecklistType;
use rchecklist::models::role::Role;
use rchecklist::models::status::SubmissionStatus;
use rchecklist::models::task_result::{AuditState, TaskResult};
use rchecklist::models::template::ChecklistTemplate;
use std::sync::Arc;
use std::sync::atomic::Ordering;

mod common;
use common::{
    MemoryPhotos, MemoryStore, STORE, ScriptedAuditor, StubCamera, date, dt, finalized,
    photo_task, png_bytes, task, template, value_task,
};

fn session(
    store: &Arc<MemoryStore>,
    t: &ChecklistTemplate,
    clock: &ManualClock,
    user: &str,
    role: Role,
) -> ChecklistSession {
    ChecklistSession::new(
        t.clone(),
        Operator {
            store_id: STORE.to_string(),
            user_id: user.to_string(),
            role,
        },
        store.clone(),
        Arc::new(clock.clone()),
        SessionSettings::default(),
    )
}

fn coordinator() -> FinalizeCoordinator {
    FinalizeCoordinator::new(
        Arc::new(ScriptedAuditor::default()),
        Arc::new(MemoryPhotos::default()),
    )
}

fn setup() -> (Arc<MemoryStore>, ChecklistTemplate, ManualClock) {
    let t = template("opening", "Opening", ChecklistType::Opening, 0);
    let store = Arc::new(MemoryStore::with_templates(vec![t.clone()]));
    let clock = ManualClock::new(dt("2026-10-16 10:00:00"));
    (store, t, clock)
}

#[tokio::test]
async fn test_open_finds_template_by_id_or_name() {
    let (store, _t, clock) = setup();
    let operator = Operator {
        store_id: STORE.to_string(),
        user_id: "alice".to_string(),
        role: Role::Staff,
    };

    let by_name = ChecklistSession::open(
        "OPENING",
        operator.clone(),
        store.clone(),
        Arc::new(clock.clone()),
        SessionSettings::default(),
    )
    .await
    .unwrap();
    assert_eq!(by_name.template().id, "opening");

    let missing = ChecklistSession::open(
        "closing",
        operator,
        store.clone(),
        Arc::new(clock.clone()),
        SessionSettings::default(),
    )
    .await;
    assert!(matches!(missing, Err(AppError::UnknownTemplate(_))));
}

#[tokio::test]
async fn test_first_toggle_creates_a_shared_draft() {
    let (store, t, clock) = setup();
    let mut alice = session(&store, &t, &clock, "alice", Role::Staff);

    assert_eq!(alice.refresh().await.unwrap(), RefreshOutcome::Empty);
    alice.toggle_task("a", true).unwrap();
    alice.flush().await;

    let all = store.all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status, SubmissionStatus::Draft);
    assert_eq!(all[0].date, date("2026-10-16"));
    let a = all[0].result("a").unwrap();
    assert!(a.completed);
    assert_eq!(a.completed_by.as_deref(), Some("alice"));

    let mut bob = session(&store, &t, &clock, "bob", Role::Staff);
    assert_eq!(
        bob.refresh().await.unwrap(),
        RefreshOutcome::Merged { switched: true }
    );
    let view = bob.view();
    assert_eq!(view.submission_id, Some(all[0].id.clone()));
    assert!(view.tasks[0].result.as_ref().is_some_and(|r| r.completed));
    assert!(!view.tasks[0].leased);

    // Bob adds to the same draft instead of creating another one.
    bob.toggle_task("b", true).unwrap();
    bob.flush().await;
    let all = store.all();
    assert_eq!(all.len(), 1);
    assert!(all[0].result("a").unwrap().completed);
    assert!(all[0].result("b").unwrap().completed);
}

#[tokio::test]
async fn test_unknown_task_and_template_are_rejected() {
    let (store, t, clock) = setup();
    let mut s = session(&store, &t, &clock, "alice", Role::Staff);

    assert!(matches!(
        s.toggle_task("nope", true),
        Err(AppError::UnknownTask(_))
    ));
    let update = UpdateRequest {
        submission_id: None,
        template_id: "other".into(),
        task_responses: vec![TaskResult::new("a")],
        is_final: false,
        target_date: date("2026-10-16"),
    };
    assert!(matches!(
        s.on_update(update),
        Err(AppError::UnknownTemplate(_))
    ));
    assert!(s.current().is_none());
}

#[tokio::test]
async fn test_update_without_id_writes_to_the_shown_draft() {
    let (store, t, clock) = setup();
    let mut s = session(&store, &t, &clock, "alice", Role::Staff);

    s.toggle_task("a", true).unwrap();
    s.flush().await;
    let first = s.current().unwrap().id.clone();

    let mut b = TaskResult::new("b");
    b.set_completed(true, "alice", dt("2026-10-16 10:00:00"));
    s.on_update(UpdateRequest {
        submission_id: None,
        template_id: "opening".into(),
        task_responses: vec![b],
        is_final: false,
        target_date: date("2026-10-16"),
    })
    .unwrap();
    s.flush().await;

    assert_eq!(s.current().unwrap().id, first);
    assert!(s.responses()["a"].completed);
    assert!(s.responses()["b"].completed);

    let all = store.all();
    assert_eq!(all.len(), 1);
    assert!(all[0].result("a").unwrap().completed);
    assert!(all[0].result("b").unwrap().completed);

    // An id that is not the shown draft is refused.
    let stray = s.on_update(UpdateRequest {
        submission_id: Some("someone-else".into()),
        template_id: "opening".into(),
        task_responses: vec![TaskResult::new("a")],
        is_final: false,
        target_date: date("2026-10-16"),
    });
    assert!(matches!(stray, Err(AppError::UnknownSubmission(_))));
    assert_eq!(store.all().len(), 1);
}

#[tokio::test]
async fn test_final_update_must_go_through_finalize() {
    let (store, t, clock) = setup();
    let mut s = session(&store, &t, &clock, "alice", Role::Staff);

    let mut a = TaskResult::new("a");
    a.set_completed(true, "alice", dt("2026-10-16 10:00:00"));
    let result = s.on_update(UpdateRequest {
        submission_id: None,
        template_id: "opening".into(),
        task_responses: vec![a],
        is_final: true,
        target_date: date("2026-10-16"),
    });
    s.flush().await;

    assert!(matches!(result, Err(AppError::FinalUpdateRejected)));
    assert!(s.current().is_none());
    assert!(store.all().is_empty());
}

#[tokio::test]
async fn test_blocked_finalize_writes_nothing() {
    let mut t = template("opening", "Opening", ChecklistType::Opening, 0);
    t.tasks = vec![task("a"), photo_task("floor", 1)];
    let store = Arc::new(MemoryStore::with_templates(vec![t.clone()]));
    let clock = ManualClock::new(dt("2026-10-16 10:00:00"));
    let mut s = session(&store, &t, &clock, "alice", Role::Staff);

    s.toggle_task("a", true).unwrap();
    s.toggle_task("floor", true).unwrap();
    s.flush().await;
    let before = store.all();

    let err = s.finalize(&coordinator(), true).await.unwrap_err();
    s.flush().await;

    assert!(matches!(err, AppError::FinalizeBlocked { .. }));
    assert_eq!(store.all(), before);
    assert_eq!(before[0].status, SubmissionStatus::Draft);
    assert!(!s.is_read_only());
}

#[tokio::test]
async fn test_set_value_completes_value_tasks() {
    let mut t = template("opening", "Opening", ChecklistType::Opening, 0);
    t.tasks = vec![value_task("temp"), task("b")];
    let store = Arc::new(MemoryStore::with_templates(vec![t.clone()]));
    let clock = ManualClock::new(dt("2026-10-16 10:00:00"));
    let mut s = session(&store, &t, &clock, "alice", Role::Staff);

    s.set_value("temp", " 4.5 ").unwrap();
    let r = &s.responses()["temp"];
    assert_eq!(r.value.as_deref(), Some("4.5"));
    assert!(r.completed);

    s.set_value("temp", "   ").unwrap();
    let r = &s.responses()["temp"];
    assert_eq!(r.value, None);
    assert!(!r.completed);

    // A plain task keeps its value without completing.
    s.set_value("b", "note").unwrap();
    assert!(!s.responses()["b"].completed);

    s.set_comment("b", "checked twice").unwrap();
    assert_eq!(s.responses()["b"].comment.as_deref(), Some("checked twice"));
    assert_eq!(s.responses()["b"].value.as_deref(), Some("note"));
}

#[tokio::test]
async fn test_finalize_locks_until_next_day() {
    let (store, t, clock) = setup();
    let mut alice = session(&store, &t, &clock, "alice", Role::Staff);

    assert!(matches!(
        alice.finalize(&coordinator(), true).await,
        Err(AppError::NothingToFinalize)
    ));

    alice.toggle_task("a", true).unwrap();
    alice.toggle_task("b", true).unwrap();
    alice.finalize(&coordinator(), false).await.unwrap();
    alice.flush().await;

    assert!(alice.is_read_only());
    assert!(matches!(
        alice.toggle_task("a", false),
        Err(AppError::ReadOnly(_))
    ));
    let last = alice.last_update().unwrap();
    assert!(last.is_final);

    let stored = store.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, SubmissionStatus::Pending);
    assert_eq!(stored[0].submitted_at, Some(dt("2026-10-16 10:00:00")));
    assert_eq!(stored[0].submitted_by.as_deref(), Some("alice"));

    // Another device sees the lock.
    let mut bob = session(&store, &t, &clock, "bob", Role::Staff);
    bob.refresh().await.unwrap();
    let view = bob.view();
    assert!(view.is_read_only);
    assert_eq!(view.locked_until, Some(dt("2026-10-17 00:00:00")));
    assert_eq!(view.status, Some(SubmissionStatus::Pending));

    // Next day: a fresh, empty checklist.
    clock.set(dt("2026-10-17 00:00:01"));
    assert_eq!(bob.refresh().await.unwrap(), RefreshOutcome::Cleared);
    let view = bob.view();
    assert!(!view.is_read_only);
    assert_eq!(view.submission_id, None);
    assert_eq!(view.target_date, date("2026-10-17"));
}

#[tokio::test]
async fn test_guard_holds_right_after_finalize() {
    let (store, t, clock) = setup();
    let mut s = session(&store, &t, &clock, "alice", Role::Staff);
    s.toggle_task("a", true).unwrap();
    s.toggle_task("b", true).unwrap();
    s.finalize(&coordinator(), false).await.unwrap();

    // Write not landed yet: the guard keeps the finalized view.
    assert_eq!(s.refresh().await.unwrap(), RefreshOutcome::Guarded);
    assert!(s.is_read_only());

    s.flush().await;
    clock.advance(TimeDelta::seconds(8));
    assert_eq!(
        s.refresh().await.unwrap(),
        RefreshOutcome::Merged { switched: false }
    );
    assert!(s.is_read_only());
}

#[tokio::test]
async fn test_missing_draft_is_held_while_leased_then_cleared() {
    let (store, t, clock) = setup();
    store.drop_puts.store(true, Ordering::SeqCst);
    let mut s = session(&store, &t, &clock, "alice", Role::Staff);

    s.toggle_task("a", true).unwrap();
    s.flush().await;
    assert!(store.all().is_empty());

    clock.advance(TimeDelta::seconds(2));
    assert_eq!(s.refresh().await.unwrap(), RefreshOutcome::Held);
    assert!(s.responses()["a"].completed);

    clock.advance(TimeDelta::seconds(5));
    assert_eq!(s.refresh().await.unwrap(), RefreshOutcome::Cleared);
    assert!(s.current().is_none());
    assert!(s.responses().is_empty());
}

#[tokio::test]
async fn test_stale_snapshot_does_not_revert_a_fresh_edit() {
    let (store, t, clock) = setup();
    let mut s = session(&store, &t, &clock, "alice", Role::Staff);
    s.toggle_task("a", true).unwrap();
    s.flush().await;

    // Un-tick whose write never lands: the remote keeps "a" done.
    store.drop_puts.store(true, Ordering::SeqCst);
    clock.advance(TimeDelta::seconds(10));
    s.toggle_task("a", false).unwrap();
    s.flush().await;

    clock.advance(TimeDelta::seconds(3));
    s.refresh().await.unwrap();
    assert!(!s.responses()["a"].completed);
    assert!(s.view().tasks[0].leased);

    // Once the grace window is over the remote value wins.
    clock.advance(TimeDelta::seconds(4));
    s.refresh().await.unwrap();
    assert!(s.responses()["a"].completed);
}

#[tokio::test]
async fn test_add_photo_completes_photo_task() {
    let mut t = template("opening", "Opening", ChecklistType::Opening, 0);
    t.tasks = vec![photo_task("floor", 1)];
    let store = Arc::new(MemoryStore::with_templates(vec![t.clone()]));
    let clock = ManualClock::new(dt("2026-10-16 10:00:00"));
    let mut s = session(&store, &t, &clock, "alice", Role::Staff);

    let photos = Arc::new(MemoryPhotos::default());
    let uploader = PhotoCaptureUploader::new(
        Arc::new(StubCamera {
            frame: Ok(png_bytes(64, 48)),
        }),
        photos.clone(),
        PhotoSettings::default(),
    );

    let outcome = s.add_photo(&uploader, "floor").await.unwrap();
    s.flush().await;

    assert!(outcome.uploaded);
    assert_eq!(photos.blobs.lock().unwrap().len(), 1);
    let stored = store.all();
    assert_eq!(stored.len(), 1);
    let floor = stored[0].result("floor").unwrap();
    assert_eq!(floor.photo_count(), 1);
    assert!(floor.completed);
}

#[tokio::test]
async fn test_manager_operations_require_the_manager_role() {
    let (store, t, clock) = setup();
    let sub = finalized(&t, "2026-10-16", Some("2026-10-16 09:00:00"));
    store.insert(sub.clone());

    let mut staff = session(&store, &t, &clock, "alice", Role::Staff);
    assert!(matches!(
        staff.review(&sub.id, true).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        staff.reset_submission(&sub.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        staff.override_flag(&sub.id, "a").await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_manager_review_and_override() {
    let (store, t, clock) = setup();
    let mut sub = finalized(&t, "2026-10-16", Some("2026-10-16 09:00:00"));
    let mut flagged = TaskResult::new("a");
    flagged.audit = AuditState::Flagged {
        reason: "photo shows a wall".into(),
    };
    sub.task_results = vec![flagged, TaskResult::new("b")];
    store.insert(sub.clone());

    let mut mgr = session(&store, &t, &clock, "mgr", Role::Manager);

    mgr.override_flag(&sub.id, "a").await.unwrap();
    assert!(matches!(
        mgr.override_flag(&sub.id, "b").await,
        Err(AppError::NotFlagged(_))
    ));
    assert_eq!(
        mgr.review(&sub.id, true).await.unwrap(),
        SubmissionStatus::Approved
    );
    assert!(matches!(
        mgr.review("missing", true).await,
        Err(AppError::UnknownSubmission(_))
    ));
    mgr.flush().await;

    let stored = store.get(&sub.id).unwrap();
    assert_eq!(stored.status, SubmissionStatus::Approved);
    assert_eq!(stored.reviewed_by.as_deref(), Some("mgr"));
    let a = stored.result("a").unwrap();
    assert_eq!(a.manager_override(), Some(true));
    assert_eq!(a.audit_reason(), "photo shows a wall");
}

#[tokio::test]
async fn test_reopen_returns_checklist_to_editable() {
    let (store, t, clock) = setup();
    let sub = finalized(&t, "2026-10-16", Some("2026-10-16 09:00:00"));
    store.insert(sub.clone());

    let mut mgr = session(&store, &t, &clock, "mgr", Role::Manager);
    mgr.refresh().await.unwrap();
    assert!(mgr.is_read_only());

    mgr.reset_submission(&sub.id).await.unwrap();
    assert!(!mgr.is_read_only());
    assert!(mgr.current().is_none());
    mgr.flush().await;
    assert!(store.all().is_empty());

    assert_eq!(mgr.refresh().await.unwrap(), RefreshOutcome::Guarded);
    clock.advance(TimeDelta::seconds(8));
    assert_eq!(mgr.refresh().await.unwrap(), RefreshOutcome::Empty);

    assert!(matches!(
        mgr.reset_submission(&sub.id).await,
        Err(AppError::UnknownSubmission(_))
    ));
}
