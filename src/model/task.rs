//! Task value type and status state machine.
//!
//! A task is an immutable snapshot of a board card. Updates produce new
//! values (`with_content`, `with_status`) — nothing mutates in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Board status of a task. Values mirror the board column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Done")]
    Done,
    #[serde(rename = "Cancelled")]
    Cancelled,
}

impl TaskStatus {
    /// Can transition from self to `to`?
    ///
    /// Forward edges are ToDo → InProgress → Done; the reset edge
    /// InProgress → ToDo is failure compensation. Cancelled is set only
    /// by the board, never by this process.
    pub fn can_transition_to(self, to: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, to),
            (ToDo, InProgress) | (InProgress, Done) | (InProgress, ToDo)
        )
    }

    /// Is this a terminal state from the board's point of view?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "To Do" => Ok(TaskStatus::ToDo),
            "In Progress" => Ok(TaskStatus::InProgress),
            "Done" => Ok(TaskStatus::Done),
            "Cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(Error::Decode(format!("unknown task status: {other}"))),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
            TaskStatus::Cancelled => "Cancelled",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A task notification from the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Board page id. Never empty.
    pub id: String,

    /// Card title. Never blank.
    pub title: String,

    pub status: TaskStatus,

    #[serde(default)]
    pub description: String,

    /// Full page body, hydrated lazily from the board when empty.
    #[serde(default)]
    pub content: String,

    /// Name in the "AI Employee" column. Drives routing.
    pub assigned_employee: Option<String>,

    /// Human assignee, if any.
    pub assigned_to: Option<String>,

    /// Who created the card.
    pub requester: String,

    pub github_url: Option<String>,

    #[serde(default)]
    pub board_url: String,

    pub created_time: Option<DateTime<Utc>>,
    pub last_edited_time: Option<DateTime<Utc>>,

    /// Whether the "ai processed" checkbox is already set.
    #[serde(default)]
    pub ai_processed: bool,

    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Task {
    /// Validate business invariants. Called by the mapper after decode.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::Decode("task must have an id".to_string()));
        }
        if self.title.trim().is_empty() {
            return Err(Error::Decode(format!(
                "task {} must have a non-empty title",
                self.id
            )));
        }
        Ok(())
    }

    /// Is an artificial employee named in the routing column?
    pub fn has_employee_assigned(&self) -> bool {
        self.assigned_employee
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }

    /// Is this task assigned to the named employee (case-insensitive)?
    pub fn is_assigned_to(&self, employee_name: &str) -> bool {
        self.assigned_employee.as_deref().is_some_and(|assigned| {
            let assigned = assigned.trim();
            !assigned.is_empty()
                && assigned.eq_ignore_ascii_case(employee_name.trim())
        })
    }

    /// Processability rule: actionable status and an employee assigned.
    pub fn can_be_processed(&self) -> bool {
        matches!(self.status, TaskStatus::ToDo | TaskStatus::InProgress)
            && self.has_employee_assigned()
    }

    /// New value with the page body filled in.
    pub fn with_content(&self, content: impl Into<String>) -> Task {
        Task {
            content: content.into(),
            ..self.clone()
        }
    }

    /// New value carrying an updated status.
    pub fn with_status(&self, status: TaskStatus) -> Task {
        Task {
            status,
            ..self.clone()
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.title, self.id, self.status)
    }
}
