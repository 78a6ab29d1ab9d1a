//! Metric instrument factories for cadre-rs.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"cadre-rs"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for cadre-rs instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("cadre-rs")
}

/// Counter: task notifications consumed from the queue.
/// Labels: `outcome` ("processed" | "failed" | "dropped" | "poison").
pub fn tasks_consumed() -> Counter<u64> {
    meter()
        .u64_counter("cadre.tasks.consumed")
        .with_description("Task notifications consumed from the queue")
        .build()
}

/// Counter: board status transitions attempted.
/// Labels: `to`, `result` ("ok" | "refused" | "noop").
pub fn status_transitions() -> Counter<u64> {
    meter()
        .u64_counter("cadre.tasks.status_transitions")
        .with_description("Task status transitions attempted against the board")
        .build()
}

/// Counter: queue-level operations (send, read, archive).
/// Labels: `queue`, `operation`.
pub fn queue_operations() -> Counter<u64> {
    meter()
        .u64_counter("cadre.queue.operations")
        .with_description("Number of queue operations")
        .build()
}

/// Counter: memory store operations (store, recall).
/// Labels: `operation`.
pub fn memory_operations() -> Counter<u64> {
    meter()
        .u64_counter("cadre.memory.operations")
        .with_description("Number of memory store operations")
        .build()
}

/// Histogram: workflow run duration in milliseconds.
/// Labels: `workflow`, `success`.
pub fn workflow_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("cadre.workflow.duration_ms")
        .with_description("Workflow run duration in milliseconds")
        .with_unit("ms")
        .build()
}

/// Counter: tasks that failed assignment validation.
/// Labels: `reason` ("unprocessable" | "unknown_employee" | "incapable").
pub fn tasks_unroutable() -> Counter<u64> {
    meter()
        .u64_counter("cadre.tasks.unroutable")
        .with_description("Tasks with no matching employee capability")
        .build()
}
