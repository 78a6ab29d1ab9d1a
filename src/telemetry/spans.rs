//! Span helpers for the task pipeline and LLM calls.
//!
//! LLM spans follow the OpenTelemetry GenAI semantic conventions
//! (`gen_ai.*` attributes); pipeline spans carry the task and employee
//! identity so board-side failures can be traced to a single run.

use tracing::Span;

/// Start a span wrapping one task's trip through the pipeline.
///
/// The `task.employee` field is declared empty and is recorded once the
/// resolver has picked an employee.
pub fn start_task_span(task_id: &str, workflow: Option<&str>) -> Span {
    tracing::info_span!(
        "task.process",
        "task.id" = task_id,
        "task.workflow" = workflow,
        "task.employee" = tracing::field::Empty,
    )
}

/// Record the resolved employee on the pipeline span.
pub fn record_employee(span: &Span, employee: &str) {
    span.record("task.employee", employee);
}

/// Record a board status transition as an event on the given span.
pub fn record_status_transition(span: &Span, from: &str, to: &str) {
    span.in_scope(|| {
        tracing::info!(from = from, to = to, "status_transition");
    });
}

/// Start a span for a chat/completion operation.
///
/// Token usage fields are declared empty and can be filled later via
/// [`record_token_usage`].
pub fn start_chat_span(model: &str, provider: &str) -> Span {
    tracing::info_span!(
        "gen_ai.chat",
        "gen_ai.operation.name" = "chat",
        "gen_ai.request.model" = model,
        "gen_ai.provider.name" = provider,
        "gen_ai.usage.input_tokens" = tracing::field::Empty,
        "gen_ai.usage.output_tokens" = tracing::field::Empty,
    )
}

/// Record token usage on a chat span created by [`start_chat_span`].
pub fn record_token_usage(span: &Span, input: u64, output: u64) {
    span.record("gen_ai.usage.input_tokens", input);
    span.record("gen_ai.usage.output_tokens", output);
}
