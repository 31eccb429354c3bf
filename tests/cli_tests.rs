use predicates::str::contains;

mod common;
use common::{CliEnv, OPENING_YAML, write_file, write_png};

/// Initialized environment with the opening template imported.
fn setup() -> CliEnv {
    let env = CliEnv::new();
    env.init();

    let file = env.path("templates.yaml");
    write_file(&file, OPENING_YAML);
    env.rcl()
        .args(["template", "import", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Imported 'Opening Checklist' (OPENING, 3 tasks)"));
    env
}

#[test]
fn test_init_creates_database() {
    let env = CliEnv::new();
    env.rcl()
        .args(["--test", "init"])
        .assert()
        .success()
        .stdout(contains("Database initialized at"))
        .stdout(contains("initialization completed"));

    assert!(std::path::Path::new(&env.db).exists());
    assert!(env.submission_ids().is_empty());
}

#[test]
fn test_template_list() {
    let env = setup();
    env.rcl()
        .args(["template", "list"])
        .assert()
        .success()
        .stdout(contains("opening"))
        .stdout(contains("Opening Checklist"))
        .stdout(contains("OPENING"));
}

#[test]
fn test_template_list_empty_store() {
    let env = CliEnv::new();
    env.init();
    env.rcl()
        .args(["template", "list"])
        .assert()
        .success()
        .stdout(contains("No templates for store"));
}

#[test]
fn test_invalid_template_file_is_rejected() {
    let env = CliEnv::new();
    env.init();
    let file = env.path("bad.yaml");
    write_file(
        &file,
        "- id: x\n  name: Broken\n  type: OPENING\n  unlock_hour: 30\n  tasks: []\n",
    );

    env.rcl()
        .args(["template", "import", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Invalid unlock hour"));
}

#[test]
fn test_unknown_template() {
    let env = setup();
    env.rcl()
        .args(["status", "closing"])
        .assert()
        .failure()
        .stderr(contains("Unknown template"));
}

#[test]
fn test_invalid_role() {
    let env = setup();
    env.rcl()
        .args(["--role", "owner", "status", "opening"])
        .assert()
        .failure()
        .stderr(contains("Invalid role"));
}

#[test]
fn test_toggle_creates_draft() {
    let env = setup();
    env.rcl()
        .args(["status", "opening"])
        .assert()
        .success()
        .stdout(contains("none yet"))
        .stdout(contains("Editable"));

    env.rcl()
        .args(["toggle", "opening", "lights"])
        .assert()
        .success()
        .stdout(contains("Task 'lights' marked as done."));

    env.rcl()
        .args(["status", "opening"])
        .assert()
        .success()
        .stdout(contains("DRAFT"))
        .stdout(contains("alice"));

    // A second toggle reuses the same draft.
    env.rcl()
        .args(["comment", "opening", "lights", "two bulbs out"])
        .assert()
        .success()
        .stdout(contains("Comment of task 'lights' saved."));
    assert_eq!(env.submission_ids().len(), 1);

    env.rcl()
        .args(["status", "opening"])
        .assert()
        .success()
        .stdout(contains("two bulbs out"));
}

#[test]
fn test_full_checklist_lifecycle() {
    let env = setup();
    let image = env.path("floor.png");
    write_png(&image, 1200, 900);

    env.rcl()
        .args(["toggle", "opening", "lights"])
        .assert()
        .success();

    // Missing photo blocks the finalize even with --yes.
    env.rcl()
        .args(["finalize", "opening", "--yes"])
        .assert()
        .failure()
        .stderr(contains("required photos missing"))
        .stderr(contains("Floor clean (0/1)"));

    env.rcl()
        .args(["photo", "opening", "floor", "--file", image.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Photo stored for task 'floor'."))
        .stdout(contains("Photos: 1/1 (task done)"));

    env.rcl()
        .args(["value", "opening", "fridge", "3.5"])
        .assert()
        .success()
        .stdout(contains("Value of task 'fridge' set to '3.5'."));

    env.rcl()
        .args(["finalize", "opening"])
        .assert()
        .success()
        .stdout(contains("submitted for review"));

    let ids = env.submission_ids();
    assert_eq!(ids.len(), 1);
    let id = ids[0].clone();

    env.rcl()
        .args(["toggle", "opening", "lights", "--off"])
        .assert()
        .failure()
        .stderr(contains("locked"));

    env.rcl()
        .args(["status", "opening"])
        .assert()
        .success()
        .stdout(contains("PENDING"))
        .stdout(contains("Locked until"));

    env.rcl()
        .args(["review", &id, "--approve"])
        .assert()
        .failure()
        .stderr(contains("requires the manager role"));

    // No auditor configured: nothing was flagged.
    env.rcl()
        .args(["--role", "manager", "override", &id, "floor"])
        .assert()
        .failure()
        .stderr(contains("has no flagged audit to override"));

    env.rcl()
        .args(["--role", "manager", "review", &id, "--approve"])
        .assert()
        .success()
        .stdout(contains(format!("Submission {id} is now APPROVED.")));

    env.rcl()
        .args(["--role", "manager", "reopen", &id, "--yes"])
        .assert()
        .success()
        .stdout(contains("'Opening Checklist' reopened"));
    assert!(env.submission_ids().is_empty());

    env.rcl()
        .args(["status", "opening"])
        .assert()
        .success()
        .stdout(contains("none yet"))
        .stdout(contains("Editable"));

    env.rcl()
        .args(["log", "--print"])
        .assert()
        .success()
        .stdout(contains("finalize"))
        .stdout(contains("review"))
        .stdout(contains("reopen"));
}

#[test]
fn test_finalize_asks_before_submitting_incomplete_tasks() {
    let env = setup();
    let image = env.path("floor.png");
    write_png(&image, 64, 64);

    env.rcl()
        .args(["photo", "opening", "floor", "--file", image.to_str().unwrap()])
        .assert()
        .success();

    env.rcl()
        .args(["finalize", "opening"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(contains("Some tasks are incomplete"))
        .stdout(contains("Operation cancelled."));

    env.rcl()
        .args(["status", "opening"])
        .assert()
        .success()
        .stdout(contains("DRAFT"));

    env.rcl()
        .args(["finalize", "opening", "--yes"])
        .assert()
        .success()
        .stdout(contains("submitted for review"));
}

#[test]
fn test_finalize_without_draft() {
    let env = setup();
    env.rcl()
        .args(["finalize", "opening", "--yes"])
        .assert()
        .failure()
        .stderr(contains("No active submission"));
}

#[test]
fn test_missing_photo_file_is_reported() {
    let env = setup();
    env.rcl()
        .args(["photo", "opening", "floor", "--file", "/nonexistent/floor.png"])
        .assert()
        .failure()
        .stderr(contains("Camera error"));
}

#[test]
fn test_config_check_without_file() {
    let env = CliEnv::new();
    env.rcl()
        .args(["config", "--check"])
        .assert()
        .success()
        .stdout(contains("defaults are in use"));
}

#[test]
fn test_config_print() {
    let env = CliEnv::new();
    env.rcl()
        .args(["config", "--print"])
        .assert()
        .success()
        .stdout(contains("store_id: main"))
        .stdout(contains("user_id: alice"));
}
