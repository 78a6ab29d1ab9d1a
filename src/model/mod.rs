//! Core data model.
//!
//! A task is a board card that needs doing. Employees claim tasks via
//! capability rules and process them through workflows; every run ends
//! in a [`ProcessingResult`].

pub mod event;
pub mod task;

pub use event::{DomainEvent, EventKind};
pub use task::{Task, TaskStatus};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of processing one task through one workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub task_id: String,
    pub employee_id: String,
    pub workflow_type: String,
    pub success: bool,
    /// Result texts in the order the workflow produced them.
    pub results: Vec<String>,
    /// Errors accumulated along the run, in order.
    pub errors: Vec<String>,
    /// Wall-clock execution time.
    pub execution_time: Duration,
    /// Which generation model produced the text, when known.
    pub model_used: Option<String>,
}

impl ProcessingResult {
    /// A failed result carrying a single error.
    pub fn failed(
        task_id: impl Into<String>,
        employee_id: impl Into<String>,
        workflow_type: impl Into<String>,
        error: impl Into<String>,
        execution_time: Duration,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            employee_id: employee_id.into(),
            workflow_type: workflow_type.into(),
            success: false,
            results: Vec::new(),
            errors: vec![error.into()],
            execution_time,
            model_used: None,
        }
    }

    /// The text to publish back to the board, if any.
    pub fn primary_result(&self) -> Option<&str> {
        self.results.first().map(String::as_str)
    }
}
