//! Assignment resolution: is this task processable, and by whom?
//!
//! Every failure branch produces a diagnostic explaining which condition
//! failed. The diagnostics are observability only — callers branch on
//! the boolean, never on the text.

use opentelemetry::KeyValue;
use std::sync::Arc;
use tracing::warn;

use crate::employee::registry::{Registry, SharedEmployee};
use crate::model::{Task, TaskStatus};
use crate::telemetry::metrics;

/// Resolves a task to exactly one employee via the registry.
pub struct AssignmentResolver {
    registry: Arc<Registry>,
}

impl AssignmentResolver {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Find the employee named in the task's routing column.
    pub fn find(&self, task: &Task) -> Option<SharedEmployee> {
        let name = task.assigned_employee.as_deref()?;
        if name.trim().is_empty() {
            return None;
        }
        self.registry.get_by_name(name)
    }

    /// Validate the complete assignment chain: the task is processable,
    /// the named employee exists, and that employee's capability rules
    /// match.
    pub async fn validate(&self, task: &Task) -> bool {
        if !task.can_be_processed() {
            let mut reasons = Vec::new();
            if !task.has_employee_assigned() {
                reasons.push(format!(
                    "no employee assigned (current value: {:?})",
                    task.assigned_employee
                ));
            }
            if !matches!(task.status, TaskStatus::ToDo | TaskStatus::InProgress) {
                reasons.push(format!(
                    "invalid status for processing (current: '{}', expected: 'To Do' or 'In Progress')",
                    task.status
                ));
            }
            warn!(
                task = %task.id,
                title = %task.title,
                "task cannot be processed: {}",
                reasons.join(", ")
            );
            metrics::tasks_unroutable().add(1, &[KeyValue::new("reason", "unprocessable")]);
            return false;
        }

        let Some(shared) = self.find(task) else {
            let available = self.registry.active_names().await;
            warn!(
                task = %task.id,
                assignment = ?task.assigned_employee,
                ?available,
                "no employee found for assignment"
            );
            metrics::tasks_unroutable().add(1, &[KeyValue::new("reason", "unknown_employee")]);
            return false;
        };

        let employee = shared.lock().await;
        if employee.can_handle(task) {
            return true;
        }

        // Explain which rule(s) refused the task.
        let mut failures: Vec<String> = Vec::new();
        if !employee.is_active() {
            failures.push("employee is inactive".to_string());
        }
        let rule_failures: Vec<String> = employee
            .rules()
            .iter()
            .filter(|rule| !rule.capability.matches(task, employee.name()))
            .map(|rule| {
                format!(
                    "rule '{}': {}",
                    rule.workflow_type,
                    rule.capability.describe_failure(task, employee.name())
                )
            })
            .collect();
        failures.extend(rule_failures);
        let detail = if failures.is_empty() {
            "no matching rules found for this task type".to_string()
        } else {
            failures.join("; ")
        };
        warn!(
            task = %task.id,
            title = %task.title,
            employee = employee.name(),
            capabilities = ?employee.workflow_types(),
            "employee cannot handle task: {detail}"
        );
        metrics::tasks_unroutable().add(1, &[KeyValue::new("reason", "incapable")]);
        false
    }
}
