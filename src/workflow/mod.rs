//! Workflow engine: an explicit state machine per workflow type.
//!
//! Every workflow is a directed graph over a shared step vocabulary,
//! entered at gather-context and terminating at finalize or
//! handle-error. Branching lives in a pure transition function on
//! [`WorkflowKind`] so graph shapes are testable without executing
//! steps; the driver loop in [`Workflow::execute`] runs steps and
//! consults the transition until a terminal step is reached.

pub mod prompt;

use opentelemetry::KeyValue;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::employee::EmployeeProfile;
use crate::error::{Error, Result};
use crate::llm::TextGenerator;
use crate::memory::MemoryStore;
use crate::model::{ProcessingResult, Task};
use crate::telemetry::metrics;

/// Retries allowed after a failed action before giving up.
const MAX_ACTION_RETRIES: u32 = 2;
/// Extra research iterations allowed when the result looks thin.
const MAX_RESEARCH_ITERATIONS: u32 = 1;
/// Result text shorter than this is flagged by soft validation.
const MIN_RESULT_CHARS: usize = 50;
/// Research results shorter than this trigger another iteration.
const MIN_RESEARCH_CHARS: usize = 500;
/// Memories recalled per run.
const MEMORY_RECALL_LIMIT: usize = 5;
/// Hard cap on transitions per run. Any legal path is far shorter; hitting
/// this means the transition table is broken and the run is abandoned.
const MAX_TRANSITIONS: u32 = 32;

/// Sections a specification result must contain to count as complete.
const SPEC_REQUIRED_SECTIONS: [&str; 3] = ["requirements", "approach", "implementation"];

// ---------------------------------------------------------------------------
// Steps and workflow kinds
// ---------------------------------------------------------------------------

/// Step vocabulary shared by all workflow graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    GatherContext,
    AnalyzeScope,
    AnalyzeCode,
    ExecuteAction,
    GenerateDiagrams,
    ValidateResult,
    StoreMemory,
    Finalize,
    HandleError,
}

impl Step {
    pub fn is_terminal(self) -> bool {
        matches!(self, Step::Finalize | Step::HandleError)
    }

    pub fn name(self) -> &'static str {
        match self {
            Step::GatherContext => "gather_context",
            Step::AnalyzeScope => "analyze_scope",
            Step::AnalyzeCode => "analyze_code",
            Step::ExecuteAction => "execute_action",
            Step::GenerateDiagrams => "generate_diagrams",
            Step::ValidateResult => "validate_result",
            Step::StoreMemory => "store_memory",
            Step::Finalize => "finalize",
            Step::HandleError => "handle_error",
        }
    }
}

/// Graph shape for a workflow type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    Specification,
    Research,
    Documentation,
    Default,
}

impl WorkflowKind {
    /// Derive the graph shape from a workflow-type string. Unknown types
    /// get the default linear graph.
    pub fn from_type(workflow_type: &str) -> Self {
        match workflow_type {
            "specification" => WorkflowKind::Specification,
            "research" => WorkflowKind::Research,
            "documentation" => WorkflowKind::Documentation,
            _ => WorkflowKind::Default,
        }
    }

    /// All graphs enter at gather-context.
    pub fn entry(self) -> Step {
        Step::GatherContext
    }

    /// Transition function: where does the run go after `step`?
    ///
    /// Pure over the context except that retry-looping branches bump the
    /// retry counter, so the caller sees every loop accounted for.
    pub fn next(self, step: Step, ctx: &mut RunContext) -> Step {
        match step {
            Step::GatherContext => match self {
                WorkflowKind::Research => Step::AnalyzeScope,
                WorkflowKind::Documentation => Step::AnalyzeCode,
                _ => Step::ExecuteAction,
            },
            Step::AnalyzeScope | Step::AnalyzeCode => Step::ExecuteAction,
            Step::ExecuteAction => self.after_action(ctx),
            Step::GenerateDiagrams => Step::ValidateResult,
            Step::ValidateResult => match self {
                WorkflowKind::Specification => self.after_spec_validation(ctx),
                _ => Step::StoreMemory,
            },
            Step::StoreMemory => Step::Finalize,
            // Terminal steps have no successor; returning self keeps the
            // function total.
            Step::Finalize => Step::Finalize,
            Step::HandleError => Step::HandleError,
        }
    }

    /// Workflow-specific branch after execute-action.
    fn after_action(self, ctx: &mut RunContext) -> Step {
        match self {
            WorkflowKind::Specification => {
                if ctx.errors.is_empty() {
                    Step::ValidateResult
                } else if ctx.retry_count < MAX_ACTION_RETRIES {
                    ctx.retry_count += 1;
                    Step::GatherContext
                } else {
                    Step::HandleError
                }
            }
            WorkflowKind::Research => {
                if ctx.retry_count >= MAX_RESEARCH_ITERATIONS {
                    return Step::ValidateResult;
                }
                let thin = ctx
                    .last_result()
                    .is_some_and(|r| r.chars().count() < MIN_RESEARCH_CHARS);
                if thin {
                    ctx.retry_count += 1;
                    Step::AnalyzeScope
                } else {
                    Step::ValidateResult
                }
            }
            WorkflowKind::Documentation => {
                if ctx.bool_flag("has_code") {
                    Step::GenerateDiagrams
                } else {
                    Step::ValidateResult
                }
            }
            WorkflowKind::Default => Step::ValidateResult,
        }
    }

    /// Specification completeness gate after validate-result.
    fn after_spec_validation(self, ctx: &mut RunContext) -> Step {
        let complete = ctx.last_result().is_some_and(|result| {
            let lowered = result.to_lowercase();
            SPEC_REQUIRED_SECTIONS
                .iter()
                .all(|section| lowered.contains(section))
        });

        if complete {
            Step::StoreMemory
        } else if ctx.retry_count >= MAX_ACTION_RETRIES {
            ctx.errors.push(format!(
                "specification still missing required sections {SPEC_REQUIRED_SECTIONS:?} after {MAX_ACTION_RETRIES} retries"
            ));
            Step::HandleError
        } else {
            ctx.retry_count += 1;
            Step::ExecuteAction
        }
    }
}

// ---------------------------------------------------------------------------
// Run context
// ---------------------------------------------------------------------------

/// Ephemeral per-run state threaded through the steps. Created fresh for
/// every execution, never shared across runs.
pub struct RunContext {
    pub task: Task,
    pub profile: EmployeeProfile,
    pub kind: WorkflowKind,
    pub results: Vec<String>,
    pub errors: Vec<String>,
    pub context: HashMap<String, Value>,
    pub retry_count: u32,
    pub current_step: Step,
    pub final_response: String,
}

impl RunContext {
    fn new(task: Task, profile: EmployeeProfile, kind: WorkflowKind) -> Self {
        Self {
            task,
            profile,
            kind,
            results: Vec::new(),
            errors: Vec::new(),
            context: HashMap::new(),
            retry_count: 0,
            current_step: kind.entry(),
            final_response: String::new(),
        }
    }

    pub fn last_result(&self) -> Option<&str> {
        self.results.last().map(String::as_str)
    }

    /// Read a string list out of the free-form context map.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        self.context
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn bool_flag(&self, key: &str) -> bool {
        self.context
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// An immutable workflow definition: graph shape plus the collaborators
/// its steps call. All per-run state lives in the [`RunContext`].
pub struct Workflow {
    workflow_type: String,
    kind: WorkflowKind,
    generator: Arc<dyn TextGenerator>,
    memory: Arc<dyn MemoryStore>,
}

impl Workflow {
    pub fn new(
        workflow_type: impl Into<String>,
        generator: Arc<dyn TextGenerator>,
        memory: Arc<dyn MemoryStore>,
    ) -> Self {
        let workflow_type = workflow_type.into();
        let kind = WorkflowKind::from_type(&workflow_type);
        Self {
            workflow_type,
            kind,
            generator,
            memory,
        }
    }

    pub fn workflow_type(&self) -> &str {
        &self.workflow_type
    }

    pub fn kind(&self) -> WorkflowKind {
        self.kind
    }

    /// Drive a task through the graph to a terminal step.
    ///
    /// Success means no accumulated errors and a non-empty final
    /// response. Step failures are absorbed into the context's error
    /// list; only a broken transition table (traversal bound exceeded)
    /// surfaces as `Err`.
    pub async fn execute(
        &self,
        task: &Task,
        profile: &EmployeeProfile,
    ) -> Result<ProcessingResult> {
        let start = Instant::now();
        let mut ctx = RunContext::new(task.clone(), profile.clone(), self.kind);

        let mut transitions = 0u32;
        loop {
            debug!(
                workflow = %self.workflow_type,
                step = ctx.current_step.name(),
                retry = ctx.retry_count,
                "running step"
            );
            self.run_step(&mut ctx).await;

            if ctx.current_step.is_terminal() {
                break;
            }

            transitions += 1;
            if transitions > MAX_TRANSITIONS {
                return Err(Error::Execution(format!(
                    "workflow {} exceeded {MAX_TRANSITIONS} transitions at step {}",
                    self.workflow_type,
                    ctx.current_step.name()
                )));
            }
            let next = self.kind.next(ctx.current_step, &mut ctx);
            ctx.current_step = next;
        }

        let execution_time = start.elapsed();

        // The error path produces no final response — fall back to the
        // last result so the caller still sees what the generator said.
        if ctx.final_response.is_empty() {
            if let Some(last) = ctx.results.last() {
                ctx.final_response = last.clone();
            }
        }

        let success = ctx.current_step == Step::Finalize
            && ctx.errors.is_empty()
            && !ctx.final_response.is_empty();
        metrics::workflow_duration_ms().record(
            execution_time.as_secs_f64() * 1000.0,
            &[
                KeyValue::new("workflow", self.workflow_type.clone()),
                KeyValue::new("success", success),
            ],
        );

        Ok(ProcessingResult {
            task_id: task.id.clone(),
            employee_id: profile.id.clone(),
            workflow_type: self.workflow_type.clone(),
            success,
            results: if ctx.final_response.is_empty() {
                Vec::new()
            } else {
                vec![ctx.final_response.clone()]
            },
            errors: ctx.errors,
            execution_time,
            model_used: Some(self.generator.model_id().to_string()),
        })
    }

    async fn run_step(&self, ctx: &mut RunContext) {
        match ctx.current_step {
            Step::GatherContext => self.gather_context(ctx).await,
            Step::AnalyzeScope => analyze_scope(ctx),
            Step::AnalyzeCode => analyze_code(ctx),
            Step::ExecuteAction => self.execute_action(ctx).await,
            Step::GenerateDiagrams => generate_diagrams(ctx),
            Step::ValidateResult => validate_result(ctx),
            Step::StoreMemory => self.store_memory(ctx).await,
            Step::Finalize => finalize(ctx),
            Step::HandleError => handle_error(ctx),
        }
    }

    /// Recall memories relevant to the task. Failures are recorded but do
    /// not halt the run.
    async fn gather_context(&self, ctx: &mut RunContext) {
        let query = format!("{} {}", ctx.task.title, ctx.task.description);
        match self
            .memory
            .recall(&ctx.profile.name, &query, MEMORY_RECALL_LIMIT)
            .await
        {
            Ok(memories) => {
                debug!(
                    count = memories.len(),
                    task = %ctx.task.id,
                    "gathered memories"
                );
                ctx.context.insert("memories".to_string(), json!(memories));
            }
            Err(e) => {
                warn!(task = %ctx.task.id, "context gathering failed: {e}");
                ctx.errors.push(format!("context gathering failed: {e}"));
            }
        }
    }

    /// Invoke the generator with the composite prompt.
    async fn execute_action(&self, ctx: &mut RunContext) {
        let composite = prompt::build_composite_prompt(ctx);
        match self.generator.generate(&composite).await {
            Ok(text) => {
                info!(task = %ctx.task.id, chars = text.len(), "action completed");
                ctx.results.push(text);
            }
            Err(e) => {
                error!(task = %ctx.task.id, "action failed: {e}");
                ctx.errors.push(format!("action failed: {e}"));
            }
        }
    }

    /// Persist a summary of the run to employee memory. Failures are
    /// recorded but do not halt the run.
    async fn store_memory(&self, ctx: &mut RunContext) {
        let Some(result) = ctx.results.last() else {
            return;
        };
        let truncated: String = result.chars().take(200).collect();
        let memory_text = format!(
            "Processed task '{}' with {} workflow. Result: {truncated}...",
            ctx.task.title, self.workflow_type
        );
        let metadata = json!({
            "task_id": ctx.task.id,
            "workflow_type": self.workflow_type,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        if let Err(e) = self
            .memory
            .store(&ctx.profile.name, &memory_text, metadata)
            .await
        {
            warn!(employee = %ctx.profile.name, "memory storage failed: {e}");
            ctx.errors.push(format!("memory storage failed: {e}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Pure step bodies
// ---------------------------------------------------------------------------

/// Pull `?`-delimited question fragments out of the task content.
fn analyze_scope(ctx: &mut RunContext) {
    let mut scope: Vec<String> = Vec::new();
    if ctx.task.content.contains('?') {
        scope.extend(
            ctx.task
                .content
                .split('?')
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
        );
    }
    ctx.context.insert("research_scope".to_string(), json!(scope));
}

/// Extract fenced code blocks from the task content.
fn analyze_code(ctx: &mut RunContext) {
    let blocks = extract_code_blocks(&ctx.task.content);
    ctx.context.insert("has_code".to_string(), json!(!blocks.is_empty()));
    ctx.context.insert("code_blocks".to_string(), json!(blocks));
}

/// Append a diagram placeholder to the latest result.
fn generate_diagrams(ctx: &mut RunContext) {
    if let Some(last) = ctx.results.last_mut() {
        last.push_str(
            "\n\n## Architecture Diagram\n\
             [Diagram would be generated here based on the code structure]",
        );
    }
}

/// Soft validation: records problems without stopping the run.
fn validate_result(ctx: &mut RunContext) {
    match ctx.results.last() {
        None => ctx.errors.push("no results to validate".to_string()),
        Some(result) => {
            if result.trim().chars().count() < MIN_RESULT_CHARS {
                ctx.errors
                    .push("result too short, may be incomplete".to_string());
            }
        }
    }
}

/// Copy the last result into the final response.
fn finalize(ctx: &mut RunContext) {
    if let Some(last) = ctx.results.last() {
        ctx.final_response = last.clone();
    }
}

/// Terminal sink for failed runs.
fn handle_error(ctx: &RunContext) {
    error!(
        task = %ctx.task.id,
        errors = ?ctx.errors,
        "workflow ended in error"
    );
}

fn extract_code_blocks(content: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut rest = content;
    while let Some(start) = rest.find("```") {
        let after = &rest[start + 3..];
        match after.find("```") {
            Some(end) => {
                blocks.push(format!("```{}```", &after[..end]));
                rest = &after[end + 3..];
            }
            None => break,
        }
    }
    blocks
}
