//! Mapping between board notification payloads and the domain model.
//!
//! Notifications arrive as the board's raw page JSON: an `id`, `url`,
//! timestamps, and a `properties` map of typed property objects. The
//! mapper is lenient where the board is sloppy (missing title, unknown
//! status) and strict only about the invariants the domain needs.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use super::CommentBlock;
use crate::error::{Error, Result};
use crate::model::{Task, TaskStatus};

/// Property names that may carry the card title, in lookup order.
const TITLE_PROPERTIES: [&str; 3] = ["Title", "Task", "Name"];

/// Maximum characters per posted comment paragraph.
const MAX_CHUNK_CHARS: usize = 2000;

/// Decode a task notification into a [`Task`].
pub fn task_from_message(body: &[u8]) -> Result<Task> {
    let data: Value =
        serde_json::from_slice(body).map_err(|e| Error::Decode(format!("invalid JSON: {e}")))?;
    task_from_value(&data)
}

/// Decode already-parsed board page JSON into a [`Task`].
pub fn task_from_value(data: &Value) -> Result<Task> {
    let id = data
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let board_url = data
        .get("url")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let created_time = parse_datetime(data.get("created_time"));
    let last_edited_time = parse_datetime(data.get("last_edited_time"));

    let empty = Value::Object(Default::default());
    let properties = data.get("properties").unwrap_or(&empty);

    let task = Task {
        id,
        title: extract_title(properties),
        status: extract_status(properties),
        description: extract_rich_text(properties, "Description"),
        content: extract_content(data),
        assigned_employee: extract_text_property(properties, "AI Employee"),
        assigned_to: extract_person(properties, "assign"),
        requester: extract_person(properties, "created by").unwrap_or_else(|| "Unknown".to_string()),
        github_url: extract_url(properties, "Github"),
        board_url,
        created_time,
        last_edited_time,
        ai_processed: extract_checkbox(properties, "ai processed"),
        metadata: HashMap::new(),
    };

    task.validate()?;
    Ok(task)
}

fn extract_title(properties: &Value) -> String {
    for name in TITLE_PROPERTIES {
        let Some(prop) = properties.get(name) else {
            continue;
        };
        if prop.get("type").and_then(Value::as_str) != Some("title") {
            continue;
        }
        if let Some(text) = prop
            .get("title")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .and_then(|item| item.pointer("/text/content"))
            .and_then(Value::as_str)
        {
            return text.to_string();
        }
    }
    "Untitled Task".to_string()
}

fn extract_status(properties: &Value) -> TaskStatus {
    let prop = properties.get("Status");
    let name = prop
        .and_then(|p| {
            match p.get("type").and_then(Value::as_str) {
                Some("select") => p.pointer("/select/name"),
                Some("status") => p.pointer("/status/name"),
                _ => None,
            }
        })
        .and_then(Value::as_str)
        .unwrap_or_default();

    name.parse().unwrap_or_else(|_| {
        warn!(status = name, "unknown status, defaulting to To Do");
        TaskStatus::ToDo
    })
}

fn extract_rich_text(properties: &Value, name: &str) -> String {
    let Some(prop) = properties.get(name) else {
        return String::new();
    };
    if prop.get("type").and_then(Value::as_str) != Some("rich_text") {
        return String::new();
    }
    concat_rich_text(prop.get("rich_text"))
}

/// Text from rich-text, select, or title shaped properties.
fn extract_text_property(properties: &Value, name: &str) -> Option<String> {
    let prop = properties.get(name)?;
    match prop.get("type").and_then(Value::as_str)? {
        "rich_text" => {
            let content = concat_rich_text(prop.get("rich_text"));
            (!content.trim().is_empty()).then_some(content)
        }
        "select" => prop
            .pointer("/select/name")
            .and_then(Value::as_str)
            .map(str::to_string),
        "title" => prop
            .get("title")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .and_then(|item| item.pointer("/text/content"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// First person's display name from a people property.
fn extract_person(properties: &Value, name: &str) -> Option<String> {
    let prop = properties.get(name)?;
    if prop.get("type").and_then(Value::as_str) != Some("people") {
        return None;
    }
    let person = prop.get("people").and_then(Value::as_array)?.first()?;
    person
        .get("name")
        .or_else(|| person.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn extract_url(properties: &Value, name: &str) -> Option<String> {
    let prop = properties.get(name)?;
    if prop.get("type").and_then(Value::as_str) != Some("url") {
        return None;
    }
    prop.get("url").and_then(Value::as_str).map(str::to_string)
}

fn extract_checkbox(properties: &Value, name: &str) -> bool {
    properties
        .get(name)
        .filter(|p| p.get("type").and_then(Value::as_str) == Some("checkbox"))
        .and_then(|p| p.get("checkbox"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Inline page content, when the notification carries it.
fn extract_content(data: &Value) -> String {
    data.get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn concat_rich_text(items: Option<&Value>) -> String {
    items
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.pointer("/text/content").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_datetime(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = value?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// Comment blocks
// ---------------------------------------------------------------------------

/// Build the comment blocks for posting a response to the board:
/// a callout header, chunked paragraphs, and a model trailer.
pub fn comment_blocks(response: &str, employee_name: &str, model_used: &str) -> Vec<CommentBlock> {
    let mut blocks = vec![CommentBlock::Callout {
        text: format!("AI Assistant Response ({employee_name})"),
    }];
    blocks.extend(
        split_into_chunks(response, MAX_CHUNK_CHARS)
            .into_iter()
            .map(|text| CommentBlock::Paragraph { text }),
    );
    blocks.push(CommentBlock::ModelNote {
        text: format!("Model: {model_used}"),
    });
    blocks
}

/// Split text into chunks of at most `max_chars`, preferring paragraph
/// breaks, then falling back to word boundaries for oversized
/// paragraphs.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        let fits = current.chars().count() + paragraph.chars().count() + 2 <= max_chars;
        if !fits && !current.is_empty() {
            chunks.push(std::mem::take(&mut current).trim().to_string());
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);

        // A single paragraph longer than the limit splits on words.
        if current.chars().count() > max_chars {
            let words: Vec<&str> = current.split(' ').collect();
            let mut piece = String::new();
            for word in words {
                if piece.chars().count() + word.chars().count() + 1 > max_chars
                    && !piece.is_empty()
                {
                    chunks.push(piece.trim().to_string());
                    piece = String::new();
                }
                if !piece.is_empty() {
                    piece.push(' ');
                }
                piece.push_str(word);
            }
            current = piece;
        }
    }

    if !current.is_empty() {
        chunks.push(current.trim().to_string());
    }
    chunks
}
