//! Employee memory: store past work, recall what's relevant.
//!
//! Recall uses word-overlap scoring — the query is split into words and
//! each stored memory scores one point per query word it contains. Ties
//! keep insertion order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opentelemetry::KeyValue;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::telemetry::metrics;

/// How memories are kept and recalled for an employee.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Store a memory for the named employee.
    async fn store(&self, employee_name: &str, text: &str, metadata: Value) -> Result<()>;

    /// Recall up to `limit` memories relevant to the query, best first.
    async fn recall(&self, employee_name: &str, query: &str, limit: usize) -> Result<Vec<String>>;

    /// Total memories held for an employee.
    async fn count(&self, employee_name: &str) -> Result<usize>;
}

// ---------------------------------------------------------------------------
// In-process store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct MemoryEntry {
    text: String,
    #[allow(dead_code)] // retained for inspection/export, not used by recall
    stored_at: DateTime<Utc>,
    #[allow(dead_code)] // retained for inspection/export, not used by recall
    metadata: Value,
}

/// In-process memory store, capped per employee.
pub struct InMemoryStore {
    memories: RwLock<HashMap<String, Vec<MemoryEntry>>>,
    /// Oldest entries are dropped past this count.
    cap: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            memories: RwLock::new(HashMap::new()),
            cap: 100,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn store(&self, employee_name: &str, text: &str, metadata: Value) -> Result<()> {
        let mut memories = self.memories.write().await;
        let entries = memories.entry(employee_name.to_string()).or_default();
        entries.push(MemoryEntry {
            text: text.to_string(),
            stored_at: Utc::now(),
            metadata,
        });
        if entries.len() > self.cap {
            let excess = entries.len() - self.cap;
            entries.drain(..excess);
        }

        metrics::memory_operations().add(1, &[KeyValue::new("operation", "store")]);
        debug!(employee = employee_name, chars = text.len(), "memory stored");
        Ok(())
    }

    async fn recall(&self, employee_name: &str, query: &str, limit: usize) -> Result<Vec<String>> {
        let memories = self.memories.read().await;
        let Some(entries) = memories.get(employee_name) else {
            return Ok(Vec::new());
        };

        let query = query.to_lowercase();
        let query_words: Vec<&str> = query.split_whitespace().collect();

        let mut scored: Vec<(usize, &MemoryEntry)> = entries
            .iter()
            .filter_map(|entry| {
                let text = entry.text.to_lowercase();
                let score = query_words.iter().filter(|w| text.contains(*w)).count();
                (score > 0).then_some((score, entry))
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        metrics::memory_operations().add(1, &[KeyValue::new("operation", "recall")]);

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, entry)| entry.text.clone())
            .collect())
    }

    async fn count(&self, employee_name: &str) -> Result<usize> {
        let memories = self.memories.read().await;
        Ok(memories.get(employee_name).map_or(0, Vec::len))
    }
}
