//! Employee registry: lookup and lifecycle for the roster.
//!
//! Employees are shared with concurrent task pipelines, so each lives
//! behind a `tokio::sync::Mutex`; the registry itself is built once at
//! startup and read-only afterwards.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use super::{Employee, PerformanceSnapshot};
use crate::error::{Error, Result};

/// Shared handle to one employee.
pub type SharedEmployee = Arc<Mutex<Employee>>;

/// Registry of employees, unique by id and by case-insensitive name.
#[derive(Default)]
pub struct Registry {
    by_id: HashMap<String, SharedEmployee>,
    by_name: HashMap<String, SharedEmployee>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an employee. Id or name collisions are configuration
    /// errors — the process should not start with an ambiguous roster.
    pub fn register(&mut self, employee: Employee) -> Result<SharedEmployee> {
        let id = employee.id().to_string();
        let name_key = employee.name().trim().to_lowercase();

        if self.by_id.contains_key(&id) {
            return Err(Error::DuplicateEmployee(id));
        }
        if self.by_name.contains_key(&name_key) {
            return Err(Error::DuplicateEmployee(employee.name().to_string()));
        }

        info!(employee = employee.name(), id = %id, "employee registered");
        let shared = Arc::new(Mutex::new(employee));
        self.by_id.insert(id, Arc::clone(&shared));
        self.by_name.insert(name_key, Arc::clone(&shared));
        Ok(shared)
    }

    pub fn get(&self, id: &str) -> Option<SharedEmployee> {
        self.by_id.get(id).cloned()
    }

    /// Lookup by name, case-insensitive.
    pub fn get_by_name(&self, name: &str) -> Option<SharedEmployee> {
        self.by_name.get(&name.trim().to_lowercase()).cloned()
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let Some(shared) = self.by_id.remove(id) else {
            return false;
        };
        // The name map holds the same Arc — drop that entry too.
        self.by_name
            .retain(|_, candidate| !Arc::ptr_eq(candidate, &shared));
        true
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn all(&self) -> Vec<SharedEmployee> {
        self.by_id.values().cloned().collect()
    }

    /// Names of employees currently active.
    pub async fn active_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for shared in self.by_id.values() {
            let employee = shared.lock().await;
            if employee.is_active() {
                names.push(employee.name().to_string());
            }
        }
        names.sort();
        names
    }

    /// Performance snapshots for the whole roster.
    pub async fn snapshots(&self) -> Vec<PerformanceSnapshot> {
        let mut stats = Vec::new();
        for shared in self.by_id.values() {
            stats.push(shared.lock().await.performance_snapshot());
        }
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }
}
