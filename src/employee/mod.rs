//! The artificial employee aggregate.
//!
//! An employee owns its persona, capability rules, registered
//! workflows, performance counters, and a queue of pending domain
//! events. All state transitions go through the aggregate's methods so
//! invariants hold; concurrent access is serialized by wrapping shared
//! employees in a `tokio::sync::Mutex`.

pub mod registry;
pub mod roster;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::capability::{Capability, Rule};
use crate::error::{Error, Result};
use crate::model::{DomainEvent, EventKind, ProcessingResult, Task};
use crate::workflow::Workflow;

/// Identity and persona an employee hands to its workflows.
#[derive(Debug, Clone)]
pub struct EmployeeProfile {
    pub id: String,
    pub name: String,
    pub persona: String,
}

/// Read-only performance projection.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSnapshot {
    pub employee_id: String,
    pub name: String,
    pub is_active: bool,
    pub tasks_processed: u64,
    pub success_count: u64,
    pub success_rate: f64,
    pub last_activity: Option<DateTime<Utc>>,
    pub available_workflows: Vec<String>,
}

/// An artificial employee: a configured capability profile that claims
/// and processes tasks matching its rules.
pub struct Employee {
    id: String,
    name: String,
    persona: String,
    is_active: bool,
    rules: Vec<Rule>,
    workflows: HashMap<String, Workflow>,
    pending_events: Vec<DomainEvent>,
    tasks_processed: u64,
    success_count: u64,
    last_activity: Option<DateTime<Utc>>,
}

impl Employee {
    /// Create an active employee with no rules or workflows.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        persona: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            persona: persona.into(),
            is_active: true,
            rules: Vec::new(),
            workflows: HashMap::new(),
            pending_events: Vec::new(),
            tasks_processed: 0,
            success_count: 0,
            last_activity: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn profile(&self) -> EmployeeProfile {
        EmployeeProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            persona: self.persona.clone(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Activate the employee. Activating an already-active employee is
    /// an error, not a no-op.
    pub fn activate(&mut self) -> Result<()> {
        if self.is_active {
            return Err(Error::AlreadyActive(self.name.clone()));
        }
        self.is_active = true;
        self.push_event(EventKind::EmployeeActivated {
            employee_id: self.id.clone(),
        });
        info!(employee = %self.name, "activated");
        Ok(())
    }

    /// Deactivate the employee. Symmetric with [`Employee::activate`].
    pub fn deactivate(&mut self) -> Result<()> {
        if !self.is_active {
            return Err(Error::AlreadyInactive(self.name.clone()));
        }
        self.is_active = false;
        self.push_event(EventKind::EmployeeDeactivated {
            employee_id: self.id.clone(),
        });
        info!(employee = %self.name, "deactivated");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Rules and workflows
    // -----------------------------------------------------------------

    /// Add a capability rule. The rule list stays sorted by priority
    /// descending; equal priorities keep insertion order.
    pub fn add_rule(&mut self, capability: Capability, workflow_type: &str, priority: i32) {
        self.rules.push(Rule::new(capability, workflow_type, priority));
        self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        debug!(
            employee = %self.name,
            workflow = workflow_type,
            priority,
            "rule added"
        );
    }

    /// Register (or replace) the workflow for a type.
    pub fn add_workflow(&mut self, workflow: Workflow) {
        debug!(
            employee = %self.name,
            workflow = workflow.workflow_type(),
            "workflow registered"
        );
        self.workflows
            .insert(workflow.workflow_type().to_string(), workflow);
    }

    pub fn workflow_types(&self) -> Vec<String> {
        self.workflows.keys().cloned().collect()
    }

    /// Can this employee handle the task? Requires being active, the
    /// task assigned to this employee, and at least one matching rule.
    pub fn can_handle(&self, task: &Task) -> bool {
        if !self.is_active {
            debug!(employee = %self.name, "inactive, cannot handle");
            return false;
        }
        if !task.is_assigned_to(&self.name) {
            debug!(employee = %self.name, task = %task.id, "not assigned");
            return false;
        }
        let matched = self
            .rules
            .iter()
            .any(|rule| rule.capability.matches(task, &self.name));
        if !matched {
            debug!(employee = %self.name, task = %task.id, "no matching rules");
        }
        matched
    }

    /// Resolve the workflow for a task: first matching rule in priority
    /// order whose workflow type is registered. A matching rule bound to
    /// an unregistered type is logged and skipped, not fatal.
    pub fn resolve_workflow(&self, task: &Task) -> Option<&Workflow> {
        for rule in &self.rules {
            if !rule.capability.matches(task, &self.name) {
                continue;
            }
            match self.workflows.get(&rule.workflow_type) {
                Some(workflow) => {
                    debug!(
                        employee = %self.name,
                        workflow = %rule.workflow_type,
                        task = %task.id,
                        "workflow selected"
                    );
                    return Some(workflow);
                }
                None => {
                    warn!(
                        employee = %self.name,
                        workflow = %rule.workflow_type,
                        "matching rule names an unregistered workflow, skipping"
                    );
                }
            }
        }
        None
    }

    // -----------------------------------------------------------------
    // Processing
    // -----------------------------------------------------------------

    /// Process an assigned task through the resolved workflow.
    ///
    /// Errors out before any side effects if the task is not assigned
    /// here, no capability matches, or no workflow resolves. Workflow
    /// driver failures are converted into a failed result and a
    /// `TaskProcessingFailed` event — never propagated.
    pub async fn process(&mut self, task: &Task) -> Result<ProcessingResult> {
        if !task.is_assigned_to(&self.name) {
            return Err(Error::NotAssigned {
                task_id: task.id.clone(),
                employee: self.name.clone(),
            });
        }
        if !self.can_handle(task) {
            return Err(Error::CannotHandle {
                task_id: task.id.clone(),
                employee: self.name.clone(),
            });
        }
        let Some(workflow) = self.resolve_workflow(task) else {
            return Err(Error::NoWorkflow(task.id.clone()));
        };
        let workflow_type = workflow.workflow_type().to_string();

        info!(
            employee = %self.name,
            task = %task.title,
            workflow = %workflow_type,
            "processing task"
        );

        let profile = self.profile();
        let start = Instant::now();
        let outcome = workflow.execute(task, &profile).await;

        self.tasks_processed += 1;
        self.last_activity = Some(Utc::now());

        match outcome {
            Ok(result) => {
                if result.success {
                    self.success_count += 1;
                }
                self.push_event(EventKind::TaskProcessed {
                    employee_id: self.id.clone(),
                    task_id: task.id.clone(),
                    result_summary: format!(
                        "Processed with {workflow_type}: {}",
                        result.success
                    ),
                });
                info!(
                    employee = %self.name,
                    task = %task.id,
                    success = result.success,
                    elapsed_ms = result.execution_time.as_millis() as u64,
                    "task processed"
                );
                Ok(result)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(employee = %self.name, task = %task.id, "processing failed: {message}");
                self.push_event(EventKind::TaskProcessingFailed {
                    employee_id: self.id.clone(),
                    task_id: task.id.clone(),
                    error_message: message.clone(),
                });
                Ok(ProcessingResult::failed(
                    &task.id,
                    &self.id,
                    workflow_type,
                    message,
                    start.elapsed(),
                ))
            }
        }
    }

    // -----------------------------------------------------------------
    // Events and stats
    // -----------------------------------------------------------------

    fn push_event(&mut self, kind: EventKind) {
        self.pending_events.push(DomainEvent::new(kind));
    }

    /// Return pending domain events, clearing the queue.
    pub fn drain_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn performance_snapshot(&self) -> PerformanceSnapshot {
        let success_rate = if self.tasks_processed == 0 {
            0.0
        } else {
            self.success_count as f64 / self.tasks_processed as f64
        };
        PerformanceSnapshot {
            employee_id: self.id.clone(),
            name: self.name.clone(),
            is_active: self.is_active,
            tasks_processed: self.tasks_processed,
            success_count: self.success_count,
            success_rate,
            last_activity: self.last_activity,
            available_workflows: self.workflow_types(),
        }
    }
}

impl std::fmt::Display for Employee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Employee({}, active={}, workflows={})",
            self.name,
            self.is_active,
            self.workflows.len()
        )
    }
}
