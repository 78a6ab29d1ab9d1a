//! Task board integration.
//!
//! The board is the system of record for task status and the place
//! results are published. [`TaskTracker`] is the seam; the production
//! implementation is [`http::HttpTracker`], tests use hand-rolled
//! fakes.

pub mod http;
pub mod mapper;
pub mod status;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// External task board operations. Implementations absorb their own
/// transport failures: a `false`/`None` return means "didn't happen",
/// never a crash of the calling pipeline.
#[async_trait]
pub trait TaskTracker: Send + Sync {
    /// Set the board status column. Returns whether the update landed.
    async fn update_status(&self, task_id: &str, new_status: &str) -> bool;

    /// Append comment blocks to the task page.
    async fn post_comment(&self, task_id: &str, blocks: &[CommentBlock]) -> bool;

    /// Fetch the full page body as plain text.
    async fn get_content(&self, task_id: &str) -> Option<String>;

    /// Set the "ai processed" checkbox.
    async fn set_processed(&self, task_id: &str, processed: bool) -> bool;
}

/// A rich-text block in a posted comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommentBlock {
    /// Bold callout header naming the responding employee.
    Callout { text: String },
    /// A chunk of the response body.
    Paragraph { text: String },
    /// Italic trailer naming the generation model.
    ModelNote { text: String },
}

impl CommentBlock {
    pub fn text(&self) -> &str {
        match self {
            CommentBlock::Callout { text }
            | CommentBlock::Paragraph { text }
            | CommentBlock::ModelNote { text } => text,
        }
    }
}
