//! Shared test doubles and fixtures.
#![allow(dead_code)] // each test binary uses a subset

use async_trait::async_trait;
use cadre_rs::error::{Error, Result};
use cadre_rs::llm::TextGenerator;
use cadre_rs::model::{Task, TaskStatus};
use cadre_rs::tracker::{CommentBlock, TaskTracker};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A minimal valid task for predicate and workflow tests.
pub fn task(id: &str, title: &str, status: TaskStatus, assigned: Option<&str>) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        status,
        description: String::new(),
        content: String::new(),
        assigned_employee: assigned.map(str::to_string),
        assigned_to: None,
        requester: "tester".to_string(),
        github_url: None,
        board_url: String::new(),
        created_time: None,
        last_edited_time: None,
        ai_processed: false,
        metadata: HashMap::new(),
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Returns scripted responses in order, repeating the last one when the
/// script runs out. Counts calls.
pub struct ScriptedGenerator {
    responses: Mutex<Vec<String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
    peak: AtomicUsize,
    active: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut responses: Vec<String> = responses.into_iter().map(Into::into).collect();
        responses.reverse(); // pop() takes from the script front
        Self {
            responses: Mutex::new(responses),
            calls: AtomicUsize::new(0),
            delay: None,
            peak: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
        }
    }

    /// Make every call take this long, for concurrency observations.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of generate() calls observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_active, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let mut responses = self.responses.lock().unwrap();
        let text = if responses.len() > 1 {
            responses.pop().unwrap()
        } else {
            responses.last().cloned().unwrap_or_default()
        };
        Ok(text)
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }
}

/// Always fails.
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(Error::Execution("generator unavailable".to_string()))
    }

    fn model_id(&self) -> &str {
        "failing-model"
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Records every board interaction; responses are configurable.
pub struct RecordingTracker {
    pub status_updates: Mutex<Vec<(String, String)>>,
    pub comments: Mutex<Vec<(String, Vec<CommentBlock>)>>,
    pub processed_flags: Mutex<Vec<(String, bool)>>,
    pub page_content: Option<String>,
    pub accept_updates: bool,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self {
            status_updates: Mutex::new(Vec::new()),
            comments: Mutex::new(Vec::new()),
            processed_flags: Mutex::new(Vec::new()),
            page_content: None,
            accept_updates: true,
        }
    }

    pub fn refusing() -> Self {
        Self {
            accept_updates: false,
            ..Self::new()
        }
    }

    pub fn update_count(&self) -> usize {
        self.status_updates.lock().unwrap().len()
    }

    pub fn last_update(&self) -> Option<(String, String)> {
        self.status_updates.lock().unwrap().last().cloned()
    }
}

impl Default for RecordingTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskTracker for RecordingTracker {
    async fn update_status(&self, task_id: &str, new_status: &str) -> bool {
        self.status_updates
            .lock()
            .unwrap()
            .push((task_id.to_string(), new_status.to_string()));
        self.accept_updates
    }

    async fn post_comment(&self, task_id: &str, blocks: &[CommentBlock]) -> bool {
        self.comments
            .lock()
            .unwrap()
            .push((task_id.to_string(), blocks.to_vec()));
        self.accept_updates
    }

    async fn get_content(&self, _task_id: &str) -> Option<String> {
        self.page_content.clone()
    }

    async fn set_processed(&self, task_id: &str, processed: bool) -> bool {
        self.processed_flags
            .lock()
            .unwrap()
            .push((task_id.to_string(), processed));
        self.accept_updates
    }
}
