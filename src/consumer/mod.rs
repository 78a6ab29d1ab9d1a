//! Task consumer: pulls notifications, bounds concurrency, and drives
//! each message through resolve → status → process → publish.
//!
//! The admission gate (a counting semaphore) is the only
//! concurrency-control primitive: a message is pulled only when a
//! permit is free, so at most N pipelines are in flight. Messages are
//! acked (archived) exactly once, after their pipeline reaches a
//! terminal outcome; poison and unroutable messages are acked and
//! dropped because redelivery would not fix them.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{Instrument, error, info, warn};

use opentelemetry::KeyValue;

use crate::db::queue::{MessageSource, QueueMessage};
use crate::events::EventStore;
use crate::resolver::AssignmentResolver;
use crate::telemetry::metrics;
use crate::telemetry::spans::{record_employee, start_task_span};
use crate::tracker::status::StatusManager;
use crate::tracker::{TaskTracker, mapper};

/// Configuration for the consumer loop.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Maximum concurrently-executing pipelines.
    pub max_concurrent_tasks: usize,
    /// How often to poll the queue when idle.
    pub poll_interval: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 3,
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Collaborators the consumer orchestrates.
pub struct ConsumerDeps {
    pub source: Arc<dyn MessageSource>,
    pub resolver: Arc<AssignmentResolver>,
    pub status: Arc<StatusManager>,
    pub tracker: Arc<dyn TaskTracker>,
    pub event_store: Arc<dyn EventStore>,
}

/// The dispatch loop.
pub struct Consumer {
    deps: Arc<ConsumerDeps>,
    config: ConsumerConfig,
    gate: Arc<Semaphore>,
    shutdown: Arc<Notify>,
}

impl Consumer {
    pub fn new(deps: ConsumerDeps, config: ConsumerConfig) -> Self {
        let gate = Arc::new(Semaphore::new(config.max_concurrent_tasks));
        Self {
            deps: Arc::new(deps),
            config,
            gate,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Signal the consumer to stop accepting messages and drain.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Run until shutdown, then let in-flight pipelines drain.
    pub async fn run(&self) {
        info!(
            max_concurrent = self.config.max_concurrent_tasks,
            "consumer started"
        );
        let mut inflight: JoinSet<()> = JoinSet::new();

        loop {
            // Reap finished pipelines so the set doesn't grow unbounded.
            while inflight.try_join_next().is_some() {}

            // Pull as long as the gate has capacity and messages exist.
            loop {
                let Ok(permit) = Arc::clone(&self.gate).try_acquire_owned() else {
                    break;
                };
                match self.deps.source.next().await {
                    Ok(Some(msg)) => {
                        let deps = Arc::clone(&self.deps);
                        inflight.spawn(process_message(deps, msg, permit));
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!("queue read failed: {e}");
                        break;
                    }
                }
            }

            tokio::select! {
                _ = self.shutdown.notified() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!(inflight = inflight.len(), "consumer draining");
        while inflight.join_next().await.is_some() {}
        info!("consumer stopped");
    }
}

/// One message's trip through the pipeline. Holds its admission permit
/// for the whole run.
async fn process_message(deps: Arc<ConsumerDeps>, msg: QueueMessage, permit: OwnedSemaphorePermit) {
    let _permit = permit;

    // Decode. A malformed body is poison — ack it away, redelivery
    // cannot fix it.
    let task = match mapper::task_from_value(&msg.body) {
        Ok(task) => task,
        Err(e) => {
            error!(msg_id = msg.msg_id, "dropping poison message: {e}");
            metrics::tasks_consumed().add(1, &[KeyValue::new("outcome", "poison")]);
            ack(&deps, msg.msg_id).await;
            return;
        }
    };

    let span = start_task_span(&task.id, None);
    async {
        info!(task = %task.title, id = %task.id, "processing notification");

        // Validation failures are not transient; drop without retry.
        if !deps.resolver.validate(&task).await {
            metrics::tasks_consumed().add(1, &[KeyValue::new("outcome", "dropped")]);
            ack(&deps, msg.msg_id).await;
            return;
        }
        let Some(shared) = deps.resolver.find(&task) else {
            metrics::tasks_consumed().add(1, &[KeyValue::new("outcome", "dropped")]);
            ack(&deps, msg.msg_id).await;
            return;
        };

        // Hydrate the page body when the notification didn't carry it.
        let task = if task.content.is_empty() {
            match deps.tracker.get_content(&task.id).await {
                Some(content) if !content.is_empty() => task.with_content(content),
                _ => task,
            }
        } else {
            task
        };

        if !deps.status.to_in_progress(&task).await {
            warn!(task = %task.id, "could not move task to In Progress");
            metrics::tasks_consumed().add(1, &[KeyValue::new("outcome", "dropped")]);
            ack(&deps, msg.msg_id).await;
            return;
        }
        let task = task.with_status(crate::model::TaskStatus::InProgress);

        let mut employee = shared.lock().await;
        record_employee(&span, employee.name());

        let outcome = employee.process(&task).await;
        let events = employee.drain_events();
        let employee_name = employee.name().to_string();
        drop(employee);

        match outcome {
            Ok(result) if result.success => {
                if let Some(response) = result.primary_result() {
                    let model = result.model_used.as_deref().unwrap_or("unknown");
                    let blocks = mapper::comment_blocks(response, &employee_name, model);
                    if !deps.tracker.post_comment(&task.id, &blocks).await {
                        error!(task = %task.id, "failed to post result comment");
                    }
                }
                deps.status.to_done(&task).await;
                deps.tracker.set_processed(&task.id, true).await;
                metrics::tasks_consumed().add(1, &[KeyValue::new("outcome", "processed")]);
                info!(task = %task.title, employee = %employee_name, "task done");
            }
            Ok(result) => {
                error!(task = %task.id, errors = ?result.errors, "task processing failed");
                deps.status.revert_to_todo(&task).await;
                metrics::tasks_consumed().add(1, &[KeyValue::new("outcome", "failed")]);
            }
            Err(e) => {
                error!(task = %task.id, employee = %employee_name, "processing error: {e}");
                deps.status.revert_to_todo(&task).await;
                metrics::tasks_consumed().add(1, &[KeyValue::new("outcome", "failed")]);
            }
        }

        // Domain events are best-effort; a dead event store must not
        // wedge the pipeline.
        for event in &events {
            if let Err(e) = deps.event_store.append(event).await {
                warn!(event = event.kind_name(), "event store append failed: {e}");
            }
        }

        ack(&deps, msg.msg_id).await;
    }
    .instrument(span.clone())
    .await
}

/// Acknowledge a message. An ack failure is logged and absorbed — the
/// message will reappear after the visibility timeout, and the
/// downstream board writes are idempotent enough to survive that.
async fn ack(deps: &ConsumerDeps, msg_id: i64) {
    if let Err(e) = deps.source.ack(msg_id).await {
        error!(msg_id, "ack failed: {e}");
    }
}
