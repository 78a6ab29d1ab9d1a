//! Board payload mapping and comment chunking tests.

use cadre_rs::model::{TaskStatus, Task};
use cadre_rs::tracker::CommentBlock;
use cadre_rs::tracker::mapper::{comment_blocks, split_into_chunks, task_from_message, task_from_value};
use serde_json::json;

fn full_payload() -> serde_json::Value {
    json!({
        "id": "page-123",
        "url": "https://board.example/page-123",
        "created_time": "2025-11-03T09:15:00.000Z",
        "last_edited_time": "2025-11-04T10:00:00.000Z",
        "properties": {
            "Task": {
                "type": "title",
                "title": [{ "text": { "content": "Write spec for X" } }]
            },
            "Status": {
                "type": "select",
                "select": { "name": "To Do" }
            },
            "Description": {
                "type": "rich_text",
                "rich_text": [
                    { "text": { "content": "Part one. " } },
                    { "text": { "content": "Part two." } }
                ]
            },
            "AI Employee": {
                "type": "rich_text",
                "rich_text": [{ "text": { "content": "EngineeringManager" } }]
            },
            "assign": {
                "type": "people",
                "people": [{ "name": "Kelly", "id": "u1" }]
            },
            "created by": {
                "type": "people",
                "people": [{ "name": "Pat", "id": "u2" }]
            },
            "Github": {
                "type": "url",
                "url": "https://github.com/example/repo"
            },
            "ai processed": {
                "type": "checkbox",
                "checkbox": false
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

#[test]
fn decodes_a_full_notification() {
    let task = task_from_value(&full_payload()).unwrap();

    assert_eq!(task.id, "page-123");
    assert_eq!(task.title, "Write spec for X");
    assert_eq!(task.status, TaskStatus::ToDo);
    assert_eq!(task.description, "Part one. Part two.");
    assert_eq!(task.assigned_employee.as_deref(), Some("EngineeringManager"));
    assert_eq!(task.assigned_to.as_deref(), Some("Kelly"));
    assert_eq!(task.requester, "Pat");
    assert_eq!(task.github_url.as_deref(), Some("https://github.com/example/repo"));
    assert_eq!(task.board_url, "https://board.example/page-123");
    assert!(!task.ai_processed);
    assert!(task.created_time.is_some());
    assert!(task.can_be_processed());
}

#[test]
fn title_falls_back_across_property_names() {
    let mut payload = full_payload();
    let props = payload["properties"].as_object_mut().unwrap();
    let title = props.remove("Task").unwrap();
    props.insert("Name".to_string(), title);

    let task = task_from_value(&payload).unwrap();
    assert_eq!(task.title, "Write spec for X");
}

#[test]
fn unknown_status_defaults_to_todo() {
    let mut payload = full_payload();
    payload["properties"]["Status"]["select"]["name"] = json!("Blocked");

    let task = task_from_value(&payload).unwrap();
    assert_eq!(task.status, TaskStatus::ToDo);
}

#[test]
fn status_typed_property_is_recognized() {
    let mut payload = full_payload();
    payload["properties"]["Status"] = json!({
        "type": "status",
        "status": { "name": "In Progress" }
    });

    let task = task_from_value(&payload).unwrap();
    assert_eq!(task.status, TaskStatus::InProgress);
}

#[test]
fn missing_id_is_poison() {
    let payload = json!({ "properties": {} });
    assert!(task_from_value(&payload).is_err());
}

#[test]
fn malformed_body_is_poison() {
    assert!(task_from_message(b"{not json").is_err());
}

#[test]
fn missing_people_and_urls_stay_none() {
    let payload = json!({
        "id": "page-9",
        "properties": {
            "Title": { "type": "title", "title": [{ "text": { "content": "Bare card" } }] }
        }
    });
    let task = task_from_value(&payload).unwrap();

    assert_eq!(task.title, "Bare card");
    assert_eq!(task.requester, "Unknown");
    assert!(task.assigned_employee.is_none());
    assert!(task.github_url.is_none());
    assert!(!task.can_be_processed(), "no employee assigned");
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn task_survives_a_serde_round_trip() {
    let original = task_from_value(&full_payload()).unwrap();
    let serialized = serde_json::to_string(&original).unwrap();
    let restored: Task = serde_json::from_str(&serialized).unwrap();

    assert_eq!(restored.id, original.id);
    assert_eq!(restored.title, original.title);
    assert_eq!(restored.status, original.status);
    assert_eq!(restored.description, original.description);
    assert_eq!(restored.assigned_employee, original.assigned_employee);
    assert_eq!(restored.requester, original.requester);
    assert_eq!(restored.github_url, original.github_url);
    assert_eq!(restored.created_time, original.created_time);
    assert_eq!(restored.last_edited_time, original.last_edited_time);
}

// ---------------------------------------------------------------------------
// Comment chunking
// ---------------------------------------------------------------------------

#[test]
fn short_text_is_a_single_chunk() {
    let chunks = split_into_chunks("short and sweet", 2000);
    assert_eq!(chunks, vec!["short and sweet".to_string()]);
}

#[test]
fn chunks_prefer_paragraph_breaks() {
    let a = "a".repeat(60);
    let b = "b".repeat(60);
    let c = "c".repeat(60);
    let text = format!("{a}\n\n{b}\n\n{c}");

    let chunks = split_into_chunks(&text, 130);
    assert_eq!(chunks.len(), 2);
    assert!(chunks[0].contains(&a));
    assert!(chunks[0].contains(&b));
    assert_eq!(chunks[1], c);
}

#[test]
fn oversized_paragraphs_split_on_word_boundaries() {
    let text = (0..50).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");

    let chunks = split_into_chunks(&text, 100);
    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.chars().count() <= 100);
        assert!(!chunk.starts_with(' ') && !chunk.ends_with(' '));
    }
    // Nothing was lost.
    let rejoined = chunks.join(" ");
    assert!(rejoined.contains("word0") && rejoined.contains("word49"));
}

#[test]
fn comment_blocks_have_header_body_and_model_trailer() {
    let blocks = comment_blocks("the answer", "EngineeringManager", "model-x");

    assert_eq!(blocks.len(), 3);
    assert!(matches!(&blocks[0], CommentBlock::Callout { text } if text.contains("EngineeringManager")));
    assert!(matches!(&blocks[1], CommentBlock::Paragraph { text } if text == "the answer"));
    assert!(matches!(&blocks[2], CommentBlock::ModelNote { text } if text.contains("model-x")));
}

#[test]
fn long_responses_chunk_into_multiple_paragraphs() {
    let response = "lorem ipsum dolor sit amet ".repeat(120);
    let blocks = comment_blocks(&response, "Alice", "model-x");

    let paragraphs = blocks
        .iter()
        .filter(|b| matches!(b, CommentBlock::Paragraph { .. }))
        .count();
    assert!(paragraphs >= 2);
}
