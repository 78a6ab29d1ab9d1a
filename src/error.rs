//! Error types for cadre-rs.
//!
//! Startup problems (bad config, duplicate registrations) are fatal;
//! everything else is scoped to a single message's pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad configuration discovered at startup. Fatal.
    #[error("configuration error: {0}")]
    Config(String),

    /// Registry collision on employee id or (case-insensitive) name. Fatal.
    #[error("employee already registered: {0}")]
    DuplicateEmployee(String),

    #[error("employee {0} is already active")]
    AlreadyActive(String),

    #[error("employee {0} is already inactive")]
    AlreadyInactive(String),

    /// Task is not assigned to the employee asked to process it.
    #[error("task {task_id} is not assigned to {employee}")]
    NotAssigned { task_id: String, employee: String },

    /// No capability rule of the employee matches the task.
    #[error("employee {employee} cannot handle task {task_id}")]
    CannotHandle { task_id: String, employee: String },

    /// No registered workflow resolves for the task.
    #[error("no workflow available for task {0}")]
    NoWorkflow(String),

    /// Malformed message body. The message is poison and is dropped.
    #[error("message decode failed: {0}")]
    Decode(String),

    /// A workflow step or the text-generation call failed.
    #[error("execution failed: {0}")]
    Execution(String),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
