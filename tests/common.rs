#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rchecklist::models::checklist_type::ChecklistType;
use rchecklist::models::status::SubmissionStatus;
use rchecklist::models::submission::Submission;
use rchecklist::models::template::{ChecklistTemplate, TaskDefinition};
use rchecklist::remote::{
    AuditError, AuditVerdict, Camera, CaptureError, ContentAuditor, PhotoStorage, RemoteStore,
    StoreError, UploadError,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tempfile::TempDir;
use tokio::sync::watch;

pub const STORE: &str = "store-1";

// ---------------------------------------------------------------------------
// CLI helpers
// ---------------------------------------------------------------------------

/// Isolated CLI environment: its own HOME (config + photos) and database.
pub struct CliEnv {
    pub home: TempDir,
    pub db: String,
}

impl CliEnv {
    pub fn new() -> Self {
        let home = TempDir::new().expect("temp home");
        let db = home
            .path()
            .join("rchecklist_test.sqlite")
            .to_string_lossy()
            .to_string();
        Self { home, db }
    }

    /// `rchecklist --db <db> ...` with HOME pointing at the temp dir.
    pub fn rcl(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("rchecklist");
        cmd.env("HOME", self.home.path())
            .env("USER", "alice")
            .env_remove("RUST_LOG")
            .args(["--db", &self.db]);
        cmd
    }

    /// Initialize the DB in test mode (no config file written).
    pub fn init(&self) {
        self.rcl().args(["--test", "init"]).assert().success();
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.home.path().join(name)
    }

    /// Ids of the submissions stored in the test DB, oldest first.
    pub fn submission_ids(&self) -> Vec<String> {
        let conn = rusqlite::Connection::open(&self.db).expect("open db");
        let mut stmt = conn
            .prepare("SELECT id FROM submissions ORDER BY rowid")
            .expect("prepare");
        stmt.query_map([], |r| r.get::<_, String>(0))
            .expect("query")
            .map(|r| r.expect("row"))
            .collect()
    }
}

pub const OPENING_YAML: &str = r#"
- id: opening
  name: Opening Checklist
  type: OPENING
  unlock_hour: 0
  tasks:
    - id: lights
      title: Turn on lights
    - id: fridge
      title: Fridge temperature
      requires_value: true
    - id: floor
      title: Floor clean
      required_photos: 1
"#;

pub fn write_file(path: &Path, content: &str) {
    fs::write(path, content).expect("write fixture");
}

/// Solid-color PNG of the given size.
pub fn write_png(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 160, 200]));
    img.save(path).expect("save png");
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([10, 200, 30]),
    ));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("datetime fixture")
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date fixture")
}

pub fn task(id: &str) -> TaskDefinition {
    TaskDefinition {
        id: id.to_string(),
        title: format!("Task {id}"),
        required_photos: 0,
        requires_value: false,
        critical: false,
    }
}

pub fn photo_task(id: &str, required: u32) -> TaskDefinition {
    TaskDefinition {
        required_photos: required,
        ..task(id)
    }
}

pub fn value_task(id: &str) -> TaskDefinition {
    TaskDefinition {
        requires_value: true,
        ..task(id)
    }
}

pub fn template(id: &str, name: &str, kind: ChecklistType, unlock_hour: u32) -> ChecklistTemplate {
    ChecklistTemplate {
        id: id.to_string(),
        store_id: STORE.to_string(),
        name: name.to_string(),
        kind,
        unlock_hour,
        tasks: vec![task("a"), task("b")],
    }
}

pub fn finalized(
    template: &ChecklistTemplate,
    day: &str,
    submitted_at: Option<&str>,
) -> Submission {
    let mut sub = Submission::new_draft(&template.id, STORE, date(day));
    sub.status = SubmissionStatus::Pending;
    sub.submitted_at = submitted_at.map(dt);
    sub
}

// ---------------------------------------------------------------------------
// In-memory collaborators
// ---------------------------------------------------------------------------

/// Shared store kept in memory. Puts can be switched off to simulate
/// writes still in flight.
pub struct MemoryStore {
    submissions: Mutex<Vec<Submission>>,
    templates: Mutex<Vec<ChecklistTemplate>>,
    pub drop_puts: AtomicBool,
    pub fail_fetches: AtomicBool,
    pub fetches: AtomicUsize,
    changes: watch::Sender<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            submissions: Mutex::new(Vec::new()),
            templates: Mutex::new(Vec::new()),
            drop_puts: AtomicBool::new(false),
            fail_fetches: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
            changes,
        }
    }

    pub fn with_templates(templates: Vec<ChecklistTemplate>) -> Self {
        let store = Self::new();
        *store.templates.lock().unwrap() = templates;
        store
    }

    pub fn insert(&self, sub: Submission) {
        self.submissions.lock().unwrap().push(sub);
    }

    pub fn all(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn get(&self, id: &str) -> Option<Submission> {
        self.all().into_iter().find(|s| s.id == id)
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn fetch_submissions(&self, store_id: &str) -> Result<Vec<Submission>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("offline".into()));
        }
        Ok(self
            .all()
            .into_iter()
            .filter(|s| s.store_id == store_id)
            .collect())
    }

    async fn put_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        if self.drop_puts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write dropped".into()));
        }
        {
            let mut all = self.submissions.lock().unwrap();
            match all.iter_mut().find(|s| s.id == submission.id) {
                Some(existing) => *existing = submission.clone(),
                None => all.push(submission.clone()),
            }
        }
        self.changes.send_modify(|v| *v += 1);
        Ok(())
    }

    async fn put_submissions_registry(
        &self,
        store_id: &str,
        submissions: &[Submission],
    ) -> Result<(), StoreError> {
        {
            let mut all = self.submissions.lock().unwrap();
            all.retain(|s| s.store_id != store_id);
            all.extend(submissions.iter().cloned());
        }
        self.changes.send_modify(|v| *v += 1);
        Ok(())
    }

    async fn fetch_templates(&self, store_id: &str) -> Result<Vec<ChecklistTemplate>, StoreError> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.store_id == store_id)
            .cloned()
            .collect())
    }

    async fn put_templates(&self, templates: &[ChecklistTemplate]) -> Result<(), StoreError> {
        self.templates.lock().unwrap().extend(templates.iter().cloned());
        Ok(())
    }

    fn subscribe(&self) -> Option<watch::Receiver<u64>> {
        Some(self.changes.subscribe())
    }
}

/// Camera returning a fixed frame, or a fixed error.
pub struct StubCamera {
    pub frame: Result<Vec<u8>, CaptureError>,
}

#[async_trait]
impl Camera for StubCamera {
    async fn capture(&self, _task_id: &str) -> Result<Vec<u8>, CaptureError> {
        self.frame.clone()
    }
}

/// Photo storage in memory; `broken` makes every call fail.
#[derive(Default)]
pub struct MemoryPhotos {
    pub blobs: Mutex<HashMap<String, Vec<u8>>>,
    pub broken: AtomicBool,
}

#[async_trait]
impl PhotoStorage for MemoryPhotos {
    async fn upload(&self, jpeg: &[u8], path: &str) -> Result<String, UploadError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(UploadError::Failed("bucket offline".into()));
        }
        let reference = format!("mem://{path}");
        self.blobs
            .lock()
            .unwrap()
            .insert(reference.clone(), jpeg.to_vec());
        Ok(reference)
    }

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, UploadError> {
        self.blobs
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| UploadError::NotFound(reference.to_string()))
    }
}

/// Auditor answering from a table keyed by task label.
#[derive(Default)]
pub struct ScriptedAuditor {
    pub flag_labels: Vec<String>,
    pub unreachable: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl ContentAuditor for ScriptedAuditor {
    async fn audit(&self, jpeg: &[u8], task_label: &str) -> Result<AuditVerdict, AuditError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(AuditError::Unreachable("connection refused".into()));
        }
        assert!(!jpeg.is_empty(), "auditor received an empty image");
        if self.flag_labels.iter().any(|l| l == task_label) {
            Ok(AuditVerdict {
                flagged: true,
                reason: format!("{task_label}: not matching"),
            })
        } else {
            Ok(AuditVerdict {
                flagged: false,
                reason: "looks fine".into(),
            })
        }
    }
}
