//! HTTP implementation of [`TaskTracker`] for the upstream board API.
//!
//! All failures are logged and absorbed — the pipeline treats a lost
//! board write as a degraded outcome, never a crash.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{error, info};

use super::{CommentBlock, TaskTracker};

/// HTTP client for the board REST API.
pub struct HttpTracker {
    http: Client,
    base_url: String,
    token: SecretString,
}

impl HttpTracker {
    pub fn new(base_url: impl Into<String>, token: SecretString) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(self.token.expose_secret())
            .header("Content-Type", "application/json")
    }

    async fn patch_page(&self, task_id: &str, properties: Value) -> bool {
        let url = format!("{}/pages/{task_id}", self.base_url);
        let result = self
            .authorized(self.http.patch(&url))
            .json(&json!({ "properties": properties }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                error!(task = task_id, status = %response.status(), "page update rejected");
                false
            }
            Err(e) => {
                error!(task = task_id, "page update failed: {e}");
                false
            }
        }
    }
}

#[async_trait]
impl TaskTracker for HttpTracker {
    async fn update_status(&self, task_id: &str, new_status: &str) -> bool {
        let ok = self
            .patch_page(
                task_id,
                json!({ "Status": { "status": { "name": new_status } } }),
            )
            .await;
        if ok {
            info!(task = task_id, status = new_status, "board status updated");
        }
        ok
    }

    async fn post_comment(&self, task_id: &str, blocks: &[CommentBlock]) -> bool {
        let children: Vec<Value> = blocks.iter().map(block_to_json).collect();
        let url = format!("{}/blocks/{task_id}/children", self.base_url);
        let result = self
            .authorized(self.http.patch(&url))
            .json(&json!({ "children": children }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!(task = task_id, blocks = blocks.len(), "comment posted");
                true
            }
            Ok(response) => {
                error!(task = task_id, status = %response.status(), "comment rejected");
                false
            }
            Err(e) => {
                error!(task = task_id, "comment post failed: {e}");
                false
            }
        }
    }

    async fn get_content(&self, task_id: &str) -> Option<String> {
        let url = format!("{}/blocks/{task_id}/children", self.base_url);
        let response = match self.authorized(self.http.get(&url)).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                error!(task = task_id, status = %response.status(), "content fetch rejected");
                return None;
            }
            Err(e) => {
                error!(task = task_id, "content fetch failed: {e}");
                return None;
            }
        };

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                error!(task = task_id, "content decode failed: {e}");
                return None;
            }
        };

        let parts: Vec<String> = body
            .get("results")
            .and_then(Value::as_array)
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(block_text)
                    .collect()
            })
            .unwrap_or_default();

        Some(parts.join("\n"))
    }

    async fn set_processed(&self, task_id: &str, processed: bool) -> bool {
        self.patch_page(
            task_id,
            json!({ "ai processed": { "checkbox": processed } }),
        )
        .await
    }
}

/// Render a comment block as board block JSON.
fn block_to_json(block: &CommentBlock) -> Value {
    match block {
        CommentBlock::Callout { text } => json!({
            "object": "block",
            "type": "callout",
            "callout": {
                "rich_text": [{
                    "type": "text",
                    "text": { "content": text },
                    "annotations": { "bold": true },
                }],
                "color": "blue",
            }
        }),
        CommentBlock::Paragraph { text } => json!({
            "object": "block",
            "type": "paragraph",
            "paragraph": {
                "rich_text": [{
                    "type": "text",
                    "text": { "content": text },
                }]
            }
        }),
        CommentBlock::ModelNote { text } => json!({
            "object": "block",
            "type": "paragraph",
            "paragraph": {
                "rich_text": [{
                    "type": "text",
                    "text": { "content": text },
                    "annotations": { "italic": true, "color": "gray" },
                }]
            }
        }),
    }
}

/// Plain text from a board content block. Code blocks keep their fences
/// so downstream analysis can find them.
fn block_text(block: &Value) -> Option<String> {
    let block_type = block.get("type").and_then(Value::as_str)?;
    let rich_text = |key: &str| -> String {
        block
            .pointer(&format!("/{key}/rich_text"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.pointer("/text/content").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    };

    match block_type {
        "paragraph" | "heading_1" | "heading_2" | "heading_3" | "bulleted_list_item"
        | "numbered_list_item" | "callout" => {
            let text = rich_text(block_type);
            (!text.is_empty()).then_some(text)
        }
        "code" => {
            let language = block
                .pointer("/code/language")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let code = rich_text("code");
            (!code.is_empty()).then(|| format!("```{language}\n{code}\n```"))
        }
        _ => None,
    }
}
