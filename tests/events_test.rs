//! File event store tests.

use cadre_rs::events::{EventStore, FileEventStore};
use cadre_rs::model::{DomainEvent, EventKind};
use tempfile::tempdir;

fn processed(employee: &str, task: &str) -> DomainEvent {
    DomainEvent::new(EventKind::TaskProcessed {
        employee_id: employee.to_string(),
        task_id: task.to_string(),
        result_summary: "ok".to_string(),
    })
}

#[tokio::test]
async fn appended_events_are_queryable_by_kind() {
    let dir = tempdir().unwrap();
    let store = FileEventStore::new(dir.path().join("events.jsonl"));

    store.append(&processed("e1", "t1")).await.unwrap();
    store.append(&processed("e1", "t2")).await.unwrap();
    store
        .append(&DomainEvent::new(EventKind::EmployeeActivated {
            employee_id: "e1".to_string(),
        }))
        .await
        .unwrap();

    let events = store.query_by_kind("task_processed", 10).await.unwrap();
    assert_eq!(events.len(), 2);

    let activations = store.query_by_kind("employee_activated", 10).await.unwrap();
    assert_eq!(activations.len(), 1);
}

#[tokio::test]
async fn kind_queries_are_most_recent_first_and_bounded() {
    let dir = tempdir().unwrap();
    let store = FileEventStore::new(dir.path().join("events.jsonl"));

    for i in 0..5 {
        store.append(&processed("e1", &format!("t{i}"))).await.unwrap();
    }

    let events = store.query_by_kind("task_processed", 2).await.unwrap();
    assert_eq!(events.len(), 2);
    match &events[0].kind {
        EventKind::TaskProcessed { task_id, .. } => assert_eq!(task_id, "t4"),
        other => panic!("unexpected kind: {other:?}"),
    }
}

#[tokio::test]
async fn entity_queries_match_both_employee_and_task() {
    let dir = tempdir().unwrap();
    let store = FileEventStore::new(dir.path().join("events.jsonl"));

    store.append(&processed("e1", "t1")).await.unwrap();
    store.append(&processed("e2", "t2")).await.unwrap();

    assert_eq!(store.query_by_entity("e1", 10).await.unwrap().len(), 1);
    assert_eq!(store.query_by_entity("t2", 10).await.unwrap().len(), 1);
    assert_eq!(store.query_by_entity("t9", 10).await.unwrap().len(), 0);
}

#[tokio::test]
async fn missing_file_reads_as_empty() {
    let dir = tempdir().unwrap();
    let store = FileEventStore::new(dir.path().join("never-written.jsonl"));

    assert!(store.query_by_kind("task_processed", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_lines_are_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let store = FileEventStore::new(&path);

    store.append(&processed("e1", "t1")).await.unwrap();
    tokio::fs::write(
        &path,
        format!(
            "{}\nnot json at all\n",
            tokio::fs::read_to_string(&path).await.unwrap().trim()
        ),
    )
    .await
    .unwrap();
    store.append(&processed("e1", "t2")).await.unwrap();

    let events = store.query_by_kind("task_processed", 10).await.unwrap();
    assert_eq!(events.len(), 2, "good lines still parse");
}

#[tokio::test]
async fn events_round_trip_through_serde() {
    let event = processed("e1", "t1");
    let line = serde_json::to_string(&event).unwrap();
    let restored: DomainEvent = serde_json::from_str(&line).unwrap();

    assert_eq!(restored.event_id, event.event_id);
    assert_eq!(restored.kind_name(), "task_processed");
    assert_eq!(restored.entity_ids(), vec!["e1", "t1"]);
}
