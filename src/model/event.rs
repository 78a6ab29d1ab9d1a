//! Domain events emitted by employee business operations.
//!
//! Events are queued on the employee aggregate and drained by the
//! consumer after each message, then persisted to the event store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable fact produced by a business operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl DomainEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
        }
    }

    /// Stable name for the event variant, used for store queries.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            EventKind::TaskProcessed { .. } => "task_processed",
            EventKind::TaskProcessingFailed { .. } => "task_processing_failed",
            EventKind::EmployeeActivated { .. } => "employee_activated",
            EventKind::EmployeeDeactivated { .. } => "employee_deactivated",
        }
    }

    /// Entity ids this event touches, for entity-scoped store queries.
    pub fn entity_ids(&self) -> Vec<&str> {
        match &self.kind {
            EventKind::TaskProcessed {
                employee_id,
                task_id,
                ..
            }
            | EventKind::TaskProcessingFailed {
                employee_id,
                task_id,
                ..
            } => vec![employee_id.as_str(), task_id.as_str()],
            EventKind::EmployeeActivated { employee_id }
            | EventKind::EmployeeDeactivated { employee_id } => vec![employee_id.as_str()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    TaskProcessed {
        employee_id: String,
        task_id: String,
        result_summary: String,
    },
    TaskProcessingFailed {
        employee_id: String,
        task_id: String,
        error_message: String,
    },
    EmployeeActivated {
        employee_id: String,
    },
    EmployeeDeactivated {
        employee_id: String,
    },
}
