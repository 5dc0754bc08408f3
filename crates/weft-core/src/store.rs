//! In-memory execution store.
//!
//! The store exclusively owns execution records. Each record sits behind
//! its own lock, so mutating one execution never blocks readers of
//! another; the id map itself is a concurrent map and needs no global
//! lock.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::info;

use weft_protocols::AbortSignal;

use crate::definition::{ExecutionStatus, WorkflowExecution};

/// One stored execution: the record plus its cooperative abort signal.
pub(crate) struct ExecutionEntry {
    pub execution: RwLock<WorkflowExecution>,
    pub abort: Arc<AbortSignal>,
}

/// Process-lifetime store of execution records.
pub struct ExecutionStore {
    executions: DashMap<String, Arc<ExecutionEntry>>,
}

impl ExecutionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            executions: DashMap::new(),
        }
    }

    /// Insert a freshly created execution and return its entry handle.
    pub(crate) fn insert(&self, execution: WorkflowExecution) -> Arc<ExecutionEntry> {
        let id = execution.id.clone();
        let entry = Arc::new(ExecutionEntry {
            execution: RwLock::new(execution),
            abort: Arc::new(AbortSignal::new()),
        });
        self.executions.insert(id, entry.clone());
        entry
    }

    /// Snapshot of a single execution.
    pub async fn snapshot(&self, id: &str) -> Option<WorkflowExecution> {
        let entry = self.entry(id)?;
        let execution = entry.execution.read().await;
        Some(execution.clone())
    }

    /// Snapshots of every known execution.
    pub async fn list(&self) -> Vec<WorkflowExecution> {
        let entries: Vec<Arc<ExecutionEntry>> = self
            .executions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut snapshots = Vec::with_capacity(entries.len());
        for entry in entries {
            snapshots.push(entry.execution.read().await.clone());
        }
        snapshots
    }

    /// Cancel a running execution.
    ///
    /// Flips the record to `cancelled`, stamps `ended_at`, and trips the
    /// abort signal. Returns false for any other current status, including
    /// already-terminal records and unknown ids.
    pub async fn cancel(&self, id: &str) -> bool {
        let Some(entry) = self.entry(id) else {
            return false;
        };

        let mut execution = entry.execution.write().await;
        if execution.status != ExecutionStatus::Running {
            return false;
        }
        execution.status = ExecutionStatus::Cancelled;
        execution.ended_at = Some(Utc::now());
        entry.abort.abort();
        info!("Cancelled workflow execution: {}", id);
        true
    }

    /// Number of stored executions.
    pub fn len(&self) -> usize {
        self.executions.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }

    // Clone the Arc out so no map shard guard is held across an await.
    fn entry(&self, id: &str) -> Option<Arc<ExecutionEntry>> {
        self.executions.get(id).map(|entry| entry.value().clone())
    }
}

impl Default for ExecutionStore {
    fn default() -> Self {
        Self::new()
    }
}
