//! Domain event persistence.
//!
//! Events are appended after every processed message. The file store
//! writes one JSON object per line so the log is greppable and can be
//! tailed while the daemon runs.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::error::{Error, Result};
use crate::model::DomainEvent;

/// Append-only sink for domain events, with bounded queries.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn append(&self, event: &DomainEvent) -> Result<()>;

    /// Events of one kind, most recent first, at most `limit`.
    async fn query_by_kind(&self, kind: &str, limit: usize) -> Result<Vec<DomainEvent>>;

    /// Events touching an entity id, most recent first, at most `limit`.
    async fn query_by_entity(&self, entity_id: &str, limit: usize) -> Result<Vec<DomainEvent>>;
}

// ---------------------------------------------------------------------------
// JSONL file store
// ---------------------------------------------------------------------------

/// File-backed event store: one JSON event per line.
pub struct FileEventStore {
    path: PathBuf,
}

impl FileEventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_all(&self) -> Result<Vec<DomainEvent>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut events = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<DomainEvent>(line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    // Corrupt lines are skipped, not fatal.
                    warn!(path = %self.path.display(), "skipping bad event line: {e}");
                }
            }
        }
        Ok(events)
    }
}

#[async_trait]
impl EventStore for FileEventStore {
    async fn append(&self, event: &DomainEvent) -> Result<()> {
        let line = serde_json::to_string(event)
            .map_err(|e| Error::Other(format!("serialize event: {e}")))?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        Ok(())
    }

    async fn query_by_kind(&self, kind: &str, limit: usize) -> Result<Vec<DomainEvent>> {
        let mut events: Vec<DomainEvent> = self
            .read_all()
            .await?
            .into_iter()
            .filter(|e| e.kind_name() == kind)
            .collect();
        events.reverse();
        events.truncate(limit);
        Ok(events)
    }

    async fn query_by_entity(&self, entity_id: &str, limit: usize) -> Result<Vec<DomainEvent>> {
        let mut events: Vec<DomainEvent> = self
            .read_all()
            .await?
            .into_iter()
            .filter(|e| e.entity_ids().contains(&entity_id))
            .collect();
        events.reverse();
        events.truncate(limit);
        Ok(events)
    }
}
