//! Roster construction tests: default registry and TOML definitions.

mod common;

use std::sync::Arc;

use cadre_rs::employee::roster;
use cadre_rs::memory::InMemoryStore;
use cadre_rs::model::TaskStatus;
use common::{ScriptedGenerator, task};
use tempfile::tempdir;

fn deps() -> (Arc<ScriptedGenerator>, Arc<InMemoryStore>) {
    (
        Arc::new(ScriptedGenerator::new(["ok"])),
        Arc::new(InMemoryStore::new()),
    )
}

#[tokio::test]
async fn default_registry_has_the_three_canonical_employees() {
    let (generator, memory) = deps();
    let registry = roster::default_registry(generator, memory).unwrap();

    assert_eq!(registry.len(), 3);
    let names = registry.active_names().await;
    assert_eq!(
        names,
        vec![
            "DocSpecialist".to_string(),
            "EngineeringManager".to_string(),
            "ResearchAgent".to_string()
        ]
    );
}

#[tokio::test]
async fn engineering_manager_claims_spec_tasks() {
    let (generator, memory) = deps();
    let registry = roster::default_registry(generator, memory).unwrap();

    let manager = registry.get_by_name("engineeringmanager").unwrap();
    let manager = manager.lock().await;

    let mut spec_task = task(
        "t1",
        "Write spec for the payments system",
        TaskStatus::ToDo,
        Some("EngineeringManager"),
    );
    spec_task.description = "We need requirements and a rollout plan.".to_string();
    assert!(manager.can_handle(&spec_task));
    assert_eq!(
        manager.resolve_workflow(&spec_task).unwrap().workflow_type(),
        "specification"
    );

    // Too little substance for the content-length rule.
    let thin = task("t2", "spec", TaskStatus::ToDo, Some("EngineeringManager"));
    assert!(!manager.can_handle(&thin));
}

#[tokio::test]
async fn doc_specialist_claims_code_tasks() {
    let (generator, memory) = deps();
    let registry = roster::default_registry(generator, memory).unwrap();

    let doc = registry.get_by_name("DocSpecialist").unwrap();
    let doc = doc.lock().await;

    let mut code_task = task(
        "t1",
        "Document the parser module",
        TaskStatus::ToDo,
        Some("DocSpecialist"),
    );
    code_task.content = "```python\ndef parse(): ...\n```".to_string();
    assert!(code_task.content.len() >= 10);
    assert!(doc.can_handle(&code_task));
    assert_eq!(
        doc.resolve_workflow(&code_task).unwrap().workflow_type(),
        "documentation"
    );
}

#[tokio::test]
async fn toml_roster_loads_and_routes() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("triager.toml"),
        r#"
[employee]
id = "triage_001"
name = "Triager"
persona = "You triage incoming work."
workflows = ["default"]

[[employee.rules]]
workflow = "default"
priority = 5
keywords = ["triage", "bug"]
min_content = 10
statuses = ["To Do"]
"#,
    )
    .unwrap();
    // Non-TOML files are ignored.
    std::fs::write(dir.path().join("notes.txt"), "not a config").unwrap();

    let (generator, memory) = deps();
    let registry = roster::load_from_dir(dir.path(), generator, memory).unwrap();
    assert_eq!(registry.len(), 1);

    let triager = registry.get_by_name("Triager").unwrap();
    let triager = triager.lock().await;

    let matching = task(
        "t1",
        "Please triage this broken build",
        TaskStatus::ToDo,
        Some("Triager"),
    );
    assert!(triager.can_handle(&matching));
    assert_eq!(
        triager.resolve_workflow(&matching).unwrap().workflow_type(),
        "default"
    );

    // Status rule excludes in-flight cards.
    let in_progress = task(
        "t2",
        "Please triage this broken build",
        TaskStatus::InProgress,
        Some("Triager"),
    );
    assert!(!triager.can_handle(&in_progress));
}

#[test]
fn bad_toml_is_a_configuration_error() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("broken.toml"), "employee = 42").unwrap();

    let (generator, memory) = deps();
    assert!(roster::load_from_dir(dir.path(), generator, memory).is_err());
}

#[test]
fn missing_roster_dir_is_a_configuration_error() {
    let (generator, memory) = deps();
    assert!(
        roster::load_from_dir(std::path::Path::new("/no/such/dir"), generator, memory).is_err()
    );
}
