//! Capability rules: which tasks an employee can claim.
//!
//! A capability is a pure predicate over (task, employee name). The
//! variants are a closed set so failure diagnostics can be produced per
//! kind without runtime type inspection.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::{Task, TaskStatus};

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// Task fields a keyword capability may search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskField {
    Title,
    Description,
    Content,
}

impl TaskField {
    fn text<'a>(self, task: &'a Task) -> &'a str {
        match self {
            TaskField::Title => &task.title,
            TaskField::Description => &task.description,
            TaskField::Content => &task.content,
        }
    }

    /// Default search set: title, description, and page content.
    pub fn all() -> Vec<TaskField> {
        vec![TaskField::Title, TaskField::Description, TaskField::Content]
    }
}

/// How a composite combines its sub-capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompositeOp {
    And,
    Or,
}

impl FromStr for CompositeOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Ok(CompositeOp::And),
            "OR" => Ok(CompositeOp::Or),
            other => Err(Error::Config(format!(
                "unsupported composite operator: {other}"
            ))),
        }
    }
}

/// A predicate deciding whether a task matches an employee's capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Capability {
    /// Task's routing column names this employee.
    Assignment,
    /// Any keyword appears (case-insensitive) in the searched fields.
    Keyword {
        keywords: Vec<String>,
        fields: Vec<TaskField>,
    },
    /// Task status is one of the allowed set.
    Status { allowed: Vec<TaskStatus> },
    /// Combined title + description + content is at least this long.
    ContentLength { min: usize },
    /// AND/OR combination. Empty check lists never match.
    Composite {
        op: CompositeOp,
        checks: Vec<Capability>,
    },
}

impl Capability {
    /// Keyword capability over the default field set. Keywords are
    /// lower-cased here so matching is a plain substring scan.
    pub fn keyword(keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::keyword_in(keywords, TaskField::all())
    }

    /// Keyword capability over an explicit field set.
    pub fn keyword_in(
        keywords: impl IntoIterator<Item = impl Into<String>>,
        fields: Vec<TaskField>,
    ) -> Self {
        Capability::Keyword {
            keywords: keywords
                .into_iter()
                .map(|kw| kw.into().to_lowercase())
                .collect(),
            fields,
        }
    }

    /// Status capability from raw board strings. Unparseable entries are
    /// discarded — construction never fails on bad input.
    pub fn status(statuses: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Capability::Status {
            allowed: statuses
                .into_iter()
                .filter_map(|s| s.as_ref().parse().ok())
                .collect(),
        }
    }

    pub fn content_length(min: usize) -> Self {
        Capability::ContentLength { min }
    }

    /// Composite from a raw operator string. Operators outside AND/OR are
    /// a configuration error raised immediately.
    pub fn composite(checks: Vec<Capability>, op: &str) -> Result<Self> {
        Ok(Capability::Composite {
            op: op.parse()?,
            checks,
        })
    }

    pub fn all_of(checks: Vec<Capability>) -> Self {
        Capability::Composite {
            op: CompositeOp::And,
            checks,
        }
    }

    pub fn any_of(checks: Vec<Capability>) -> Self {
        Capability::Composite {
            op: CompositeOp::Or,
            checks,
        }
    }

    /// Does the task match? Total and side-effect free.
    pub fn matches(&self, task: &Task, employee_name: &str) -> bool {
        match self {
            Capability::Assignment => task.is_assigned_to(employee_name),
            Capability::Keyword { keywords, fields } => {
                let haystack = gather_fields(task, fields).to_lowercase();
                keywords.iter().any(|kw| haystack.contains(kw.as_str()))
            }
            Capability::Status { allowed } => allowed.contains(&task.status),
            Capability::ContentLength { min } => combined_content_len(task) >= *min,
            Capability::Composite { op, checks } => {
                if checks.is_empty() {
                    // An empty AND would vacuously match everything; force
                    // an explicit non-match for both operators instead.
                    return false;
                }
                match op {
                    CompositeOp::And => {
                        checks.iter().all(|c| c.matches(task, employee_name))
                    }
                    CompositeOp::Or => {
                        checks.iter().any(|c| c.matches(task, employee_name))
                    }
                }
            }
        }
    }

    /// Explain why this capability did not match. Diagnostic only —
    /// callers must not branch on the text.
    pub fn describe_failure(&self, task: &Task, employee_name: &str) -> String {
        match self {
            Capability::Assignment => {
                if task.is_assigned_to(employee_name) {
                    "assignment check passed but overall check failed".to_string()
                } else {
                    format!(
                        "task not assigned to {employee_name} (assigned to: {:?})",
                        task.assigned_employee
                    )
                }
            }
            Capability::Keyword { keywords, fields } => {
                let haystack = gather_fields(task, fields).to_lowercase();
                let (found, missing): (Vec<_>, Vec<_>) = keywords
                    .iter()
                    .partition(|kw| haystack.contains(kw.as_str()));
                format!(
                    "missing keywords: {missing:?} (found: {found:?}, title={:?}, content length={})",
                    task.title,
                    task.content.len()
                )
            }
            Capability::Status { allowed } => {
                format!(
                    "status '{}' not in required statuses: {allowed:?}",
                    task.status
                )
            }
            Capability::ContentLength { min } => {
                format!(
                    "content too short: {} chars < {min} required",
                    combined_content_len(task)
                )
            }
            Capability::Composite { op, checks } => {
                if checks.is_empty() {
                    return format!("composite {op:?} with no checks never matches");
                }
                let sub_failures: Vec<String> = checks
                    .iter()
                    .filter(|c| !c.matches(task, employee_name))
                    .map(|c| c.describe_failure(task, employee_name))
                    .collect();
                format!("composite {op:?} failed: [{}]", sub_failures.join("; "))
            }
        }
    }
}

fn gather_fields(task: &Task, fields: &[TaskField]) -> String {
    let mut text = String::new();
    for field in fields {
        text.push(' ');
        text.push_str(field.text(task));
    }
    text
}

fn combined_content_len(task: &Task) -> usize {
    format!("{} {} {}", task.title, task.description, task.content)
        .trim()
        .chars()
        .count()
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A priority-weighted binding from a capability to a workflow type.
#[derive(Debug, Clone)]
pub struct Rule {
    pub capability: Capability,
    pub workflow_type: String,
    /// Higher priority rules are evaluated first.
    pub priority: i32,
}

impl Rule {
    pub fn new(capability: Capability, workflow_type: impl Into<String>, priority: i32) -> Self {
        Self {
            capability,
            workflow_type: workflow_type.into(),
            priority,
        }
    }
}
