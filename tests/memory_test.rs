//! Memory store tests: word-overlap recall.

use cadre_rs::memory::{InMemoryStore, MemoryStore};
use serde_json::json;

#[tokio::test]
async fn recall_ranks_by_word_overlap() {
    let store = InMemoryStore::new();
    store
        .store("Alice", "wrote the payments spec", json!({}))
        .await
        .unwrap();
    store
        .store("Alice", "reviewed payments spec draft with the team", json!({}))
        .await
        .unwrap();
    store
        .store("Alice", "lunch order for tuesday", json!({}))
        .await
        .unwrap();

    let recalled = store
        .recall("Alice", "payments spec draft", 10)
        .await
        .unwrap();

    assert_eq!(recalled.len(), 2, "irrelevant memories are not recalled");
    assert!(recalled[0].contains("draft"), "higher overlap ranks first");
}

#[tokio::test]
async fn recall_ties_keep_insertion_order() {
    let store = InMemoryStore::new();
    store.store("Alice", "spec alpha", json!({})).await.unwrap();
    store.store("Alice", "spec beta", json!({})).await.unwrap();
    store.store("Alice", "spec gamma", json!({})).await.unwrap();

    let recalled = store.recall("Alice", "spec", 10).await.unwrap();
    assert_eq!(
        recalled,
        vec![
            "spec alpha".to_string(),
            "spec beta".to_string(),
            "spec gamma".to_string()
        ]
    );
}

#[tokio::test]
async fn recall_honors_the_limit() {
    let store = InMemoryStore::new();
    for i in 0..10 {
        store
            .store("Alice", &format!("spec item {i}"), json!({}))
            .await
            .unwrap();
    }

    let recalled = store.recall("Alice", "spec", 3).await.unwrap();
    assert_eq!(recalled.len(), 3);
}

#[tokio::test]
async fn memories_are_scoped_per_employee() {
    let store = InMemoryStore::new();
    store.store("Alice", "alpha spec", json!({})).await.unwrap();
    store.store("Bob", "beta spec", json!({})).await.unwrap();

    let alice = store.recall("Alice", "spec", 10).await.unwrap();
    assert_eq!(alice, vec!["alpha spec".to_string()]);

    assert_eq!(store.count("Alice").await.unwrap(), 1);
    assert_eq!(store.count("Bob").await.unwrap(), 1);
    assert_eq!(store.count("Nobody").await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_employee_recalls_nothing() {
    let store = InMemoryStore::new();
    let recalled = store.recall("Ghost", "anything", 5).await.unwrap();
    assert!(recalled.is_empty());
}

#[tokio::test]
async fn per_employee_cap_drops_oldest() {
    let store = InMemoryStore::new();
    for i in 0..120 {
        store
            .store("Alice", &format!("note number {i}"), json!({}))
            .await
            .unwrap();
    }

    assert_eq!(store.count("Alice").await.unwrap(), 100);
    let recalled = store.recall("Alice", "number", 200).await.unwrap();
    assert!(!recalled.iter().any(|m| m.ends_with(" 0")), "oldest dropped");
    assert!(recalled.iter().any(|m| m.contains("119")));
}
