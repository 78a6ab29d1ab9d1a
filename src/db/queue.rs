//! Queue transport: pgmq operations and the consumer-facing seam.
//!
//! pgmq gives at-least-once delivery: a read hides the message for the
//! visibility timeout, and only an archive removes it. A pipeline that
//! dies mid-flight leaves its message to reappear.

use async_trait::async_trait;
use opentelemetry::KeyValue;
use std::sync::Arc;

use crate::error::Result;
use crate::telemetry::metrics;

/// A message read from the task queue.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub msg_id: i64,
    pub read_ct: i32,
    pub body: serde_json::Value,
}

/// Where the consumer pulls task notifications from.
///
/// `ack` must remove the message permanently; an un-acked message
/// reappears after the transport's redelivery window.
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn next(&self) -> Result<Option<QueueMessage>>;
    async fn ack(&self, msg_id: i64) -> Result<()>;
}

// ---------------------------------------------------------------------------
// pgmq
// ---------------------------------------------------------------------------

impl super::Db {
    /// Create a pgmq queue (idempotent).
    pub async fn create_queue(&self, queue_name: &str) -> Result<()> {
        sqlx::query("SELECT pgmq.create($1)")
            .bind(queue_name)
            .execute(self.pool())
            .await?;
        metrics::queue_operations().add(
            1,
            &[
                KeyValue::new("queue", queue_name.to_string()),
                KeyValue::new("operation", "create"),
            ],
        );
        Ok(())
    }

    /// Send a message to a pgmq queue. Returns the message ID.
    pub async fn send_to_queue(
        &self,
        queue_name: &str,
        payload: &serde_json::Value,
    ) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT pgmq.send($1, $2, $3)")
            .bind(queue_name)
            .bind(payload)
            .bind(0i32)
            .fetch_one(self.pool())
            .await?;
        metrics::queue_operations().add(
            1,
            &[
                KeyValue::new("queue", queue_name.to_string()),
                KeyValue::new("operation", "send"),
            ],
        );
        Ok(row.0)
    }

    /// Read the next message (visibility timeout in seconds).
    /// Returns None if the queue is empty.
    pub async fn read_from_queue(
        &self,
        queue_name: &str,
        vt_seconds: i32,
    ) -> Result<Option<QueueMessage>> {
        let row = sqlx::query_as::<_, (i64, i32, serde_json::Value)>(
            "SELECT msg_id, read_ct, message FROM pgmq.read($1, $2, 1)",
        )
        .bind(queue_name)
        .bind(vt_seconds)
        .fetch_optional(self.pool())
        .await?;

        let msg = row.map(|(msg_id, read_ct, body)| QueueMessage {
            msg_id,
            read_ct,
            body,
        });

        metrics::queue_operations().add(
            1,
            &[
                KeyValue::new("queue", queue_name.to_string()),
                KeyValue::new(
                    "operation",
                    if msg.is_some() { "read" } else { "read_empty" },
                ),
            ],
        );

        Ok(msg)
    }

    /// Archive a message (moves to archive table, preserves for audit).
    pub async fn archive_message(&self, queue_name: &str, msg_id: i64) -> Result<()> {
        sqlx::query("SELECT pgmq.archive($1, $2)")
            .bind(queue_name)
            .bind(msg_id)
            .execute(self.pool())
            .await?;
        metrics::queue_operations().add(
            1,
            &[
                KeyValue::new("queue", queue_name.to_string()),
                KeyValue::new("operation", "archive"),
            ],
        );
        Ok(())
    }
}

/// pgmq-backed [`MessageSource`].
pub struct PgmqSource {
    db: Arc<super::Db>,
    queue_name: String,
    visibility_timeout: i32,
}

impl PgmqSource {
    pub fn new(db: Arc<super::Db>, queue_name: impl Into<String>, visibility_timeout: i32) -> Self {
        Self {
            db,
            queue_name: queue_name.into(),
            visibility_timeout,
        }
    }
}

#[async_trait]
impl MessageSource for PgmqSource {
    async fn next(&self) -> Result<Option<QueueMessage>> {
        self.db
            .read_from_queue(&self.queue_name, self.visibility_timeout)
            .await
    }

    async fn ack(&self, msg_id: i64) -> Result<()> {
        self.db.archive_message(&self.queue_name, msg_id).await
    }
}
