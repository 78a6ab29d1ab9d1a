//! Task status transitions against the board.
//!
//! Forward transitions are guarded so a task cannot skip In Progress
//! (that would lose auditability); the revert is unguarded because it
//! is best-effort failure compensation and must work from any in-flight
//! state.

use opentelemetry::KeyValue;
use std::sync::Arc;
use tracing::{info, warn};

use super::TaskTracker;
use crate::model::{Task, TaskStatus};
use crate::telemetry::metrics;

/// Enforces the task status state machine over the tracker sink.
pub struct StatusManager {
    tracker: Arc<dyn TaskTracker>,
}

impl StatusManager {
    pub fn new(tracker: Arc<dyn TaskTracker>) -> Self {
        Self { tracker }
    }

    /// Move a task to In Progress. No-op success if already there;
    /// refused (false, no board call) from anything but To Do.
    pub async fn to_in_progress(&self, task: &Task) -> bool {
        if task.status == TaskStatus::InProgress {
            metrics::status_transitions().add(
                1,
                &[
                    KeyValue::new("to", "In Progress"),
                    KeyValue::new("result", "noop"),
                ],
            );
            return true;
        }
        if task.status != TaskStatus::ToDo {
            warn!(
                task = %task.id,
                from = %task.status,
                "refusing transition to In Progress"
            );
            metrics::status_transitions().add(
                1,
                &[
                    KeyValue::new("to", "In Progress"),
                    KeyValue::new("result", "refused"),
                ],
            );
            return false;
        }
        self.apply(task, TaskStatus::InProgress).await
    }

    /// Move a task to Done. No-op success if already there; refused
    /// (false, no board call) from anything but In Progress.
    pub async fn to_done(&self, task: &Task) -> bool {
        if task.status == TaskStatus::Done {
            metrics::status_transitions().add(
                1,
                &[KeyValue::new("to", "Done"), KeyValue::new("result", "noop")],
            );
            return true;
        }
        if task.status != TaskStatus::InProgress {
            warn!(
                task = %task.id,
                from = %task.status,
                "refusing transition to Done"
            );
            metrics::status_transitions().add(
                1,
                &[
                    KeyValue::new("to", "Done"),
                    KeyValue::new("result", "refused"),
                ],
            );
            return false;
        }
        self.apply(task, TaskStatus::Done).await
    }

    /// Revert a task to To Do after a failed run. Unguarded — this is
    /// compensation and must work from any in-flight state.
    pub async fn revert_to_todo(&self, task: &Task) -> bool {
        self.apply(task, TaskStatus::ToDo).await
    }

    async fn apply(&self, task: &Task, to: TaskStatus) -> bool {
        let ok = self
            .tracker
            .update_status(&task.id, &to.to_string())
            .await;
        if ok {
            info!(task = %task.id, to = %to, "status updated");
        } else {
            warn!(task = %task.id, to = %to, "board status update failed");
        }
        metrics::status_transitions().add(
            1,
            &[
                KeyValue::new("to", to.to_string()),
                KeyValue::new("result", if ok { "ok" } else { "error" }),
            ],
        );
        ok
    }
}
