use rchecklist::core::template::TemplateLogic;
use rchecklist::errors::AppError;
use rchecklist::models::checklist_type::ChecklistType;
use rchecklist::remote::RemoteStore;

mod common;
use common::{MemoryStore, STORE, template, write_file};

#[test]
fn test_parse_single_json_template() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("closing.json");
    write_file(
        &file,
        r#"{"id":"close","name":"Closing","type":"CLOSING","unlock_hour":6,
            "tasks":[{"id":"till","title":"Count the till","critical":true}]}"#,
    );

    let parsed = TemplateLogic::parse_file(&file).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].kind, ChecklistType::Closing);
    assert_eq!(parsed[0].unlock_hour, 6);
    assert!(parsed[0].tasks[0].critical);
}

#[test]
fn test_parse_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("broken.yaml");
    write_file(&file, "just: [a, list");

    assert!(matches!(
        TemplateLogic::parse_file(&file),
        Err(AppError::InvalidTemplateFile(_))
    ));
}

#[test]
fn test_validate_rejects_duplicate_task_ids() {
    let mut t = template("open", "Opening", ChecklistType::Opening, 0);
    assert!(TemplateLogic::validate(&t).is_ok());

    t.tasks[1].id = "a".into();
    assert!(matches!(
        TemplateLogic::validate(&t),
        Err(AppError::InvalidTemplateFile(_))
    ));

    t.tasks.clear();
    t.unlock_hour = 24;
    assert!(matches!(
        TemplateLogic::validate(&t),
        Err(AppError::InvalidUnlockHour(24))
    ));
}

#[tokio::test]
async fn test_import_assigns_store_and_rejects_foreign_templates() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();

    let own = dir.path().join("own.yaml");
    write_file(
        &own,
        "id: w1\nname: Monday Deep Clean\ntype: WEEKLY\ntasks:\n  - id: ovens\n    title: Ovens\n",
    );
    let imported = TemplateLogic::import(&store, STORE, &own).await.unwrap();
    assert_eq!(imported[0].store_id, STORE);
    assert_eq!(store.fetch_templates(STORE).await.unwrap().len(), 1);

    let foreign = dir.path().join("foreign.yaml");
    write_file(
        &foreign,
        "- id: x\n  store_id: elsewhere\n  name: Opening\n  type: OPENING\n  tasks: []\n",
    );
    assert!(matches!(
        TemplateLogic::import(&store, STORE, &foreign).await,
        Err(AppError::InvalidTemplateFile(_))
    ));

    let empty = dir.path().join("empty.yaml");
    write_file(&empty, "[]\n");
    assert!(TemplateLogic::import(&store, STORE, &empty).await.is_err());

    let listed = TemplateLogic::list(&store, STORE).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Monday Deep Clean");
}
