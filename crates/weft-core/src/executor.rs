//! Workflow engine - round-based orchestration core.
//!
//! `execute` creates a pending execution record, spawns a task that drives
//! the round loop, and returns the execution id without blocking. Each
//! round dispatches every ready step concurrently and advances only once
//! all of them finish; callers observe progress by polling the store.

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use weft_protocols::{Capability, CapabilityContext};

use crate::condition::Condition;
use crate::definition::{ExecutionStatus, WorkflowDefinition, WorkflowExecution, WorkflowStep};
use crate::error::{ExecutionError, RegistryError};
use crate::registry::{CapabilityRegistry, WorkflowRegistry};
use crate::retry::RetryPolicy;
use crate::store::{ExecutionEntry, ExecutionStore};
use crate::template::{bind_parameters, BindContext};
use crate::validation::validate_result;

/// Per-step timeout applied when a step declares none.
const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

/// The orchestration engine.
///
/// Owns the workflow registry and execution store; capabilities are
/// provided by the caller at construction.
pub struct WorkflowEngine {
    workflows: Arc<WorkflowRegistry>,
    capabilities: Arc<CapabilityRegistry>,
    store: Arc<ExecutionStore>,
    default_timeout: Duration,
    retry_policy: RetryPolicy,
    next_execution: AtomicU64,
}

impl WorkflowEngine {
    /// Create an engine over the given capabilities.
    pub fn new(capabilities: Arc<CapabilityRegistry>) -> Self {
        Self {
            workflows: Arc::new(WorkflowRegistry::new()),
            capabilities,
            store: Arc::new(ExecutionStore::new()),
            default_timeout: DEFAULT_STEP_TIMEOUT,
            retry_policy: RetryPolicy::default(),
            next_execution: AtomicU64::new(0),
        }
    }

    /// Set the timeout applied to steps that declare none.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set the retry pacing for transient step failures.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Register a workflow.
    pub async fn register_workflow(
        &self,
        name: impl Into<String>,
        steps: Vec<WorkflowStep>,
    ) -> Result<(), RegistryError> {
        self.workflows.register(name, steps).await
    }

    /// The engine's workflow registry.
    pub fn workflows(&self) -> &WorkflowRegistry {
        &self.workflows
    }

    /// Start executing a registered workflow.
    ///
    /// Returns the new execution's id immediately; the round loop runs in
    /// a spawned task and reports only through the execution store. An id
    /// coming back is not evidence of eventual success - poll
    /// [`execution_status`](Self::execution_status) until the status is
    /// terminal.
    pub async fn execute(
        &self,
        workflow_name: &str,
        initial_data: Value,
    ) -> Result<String, ExecutionError> {
        let Some(definition) = self.workflows.lookup(workflow_name).await else {
            return Err(ExecutionError::WorkflowNotFound(workflow_name.to_string()));
        };

        let seq = self.next_execution.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("{workflow_name}-{seq}");
        let entry = self
            .store
            .insert(WorkflowExecution::new(id.clone(), workflow_name, initial_data));

        info!("Started workflow execution: {}", id);

        let driver = ExecutionDriver {
            definition,
            entry,
            capabilities: self.capabilities.clone(),
            default_timeout: self.default_timeout,
            retry_policy: self.retry_policy.clone(),
            execution_id: id.clone(),
        };
        tokio::spawn(driver.run());

        Ok(id)
    }

    /// Snapshot of one execution, or `None` for an unknown id.
    pub async fn execution_status(&self, id: &str) -> Option<WorkflowExecution> {
        self.store.snapshot(id).await
    }

    /// Snapshots of every known execution.
    pub async fn list_executions(&self) -> Vec<WorkflowExecution> {
        self.store.list().await
    }

    /// Cancel a running execution; returns false for any other status.
    pub async fn cancel_execution(&self, id: &str) -> bool {
        self.store.cancel(id).await
    }
}

/// Outcome of one step within a round.
enum StepOutcome {
    /// The step finished: ran and validated, or was skipped.
    Finished { step: String, result: Value },
    /// The step failed fatally; the execution aborts.
    Failed { step: String, error: ExecutionError },
}

/// Drives a single execution's round loop.
struct ExecutionDriver {
    definition: Arc<WorkflowDefinition>,
    entry: Arc<ExecutionEntry>,
    capabilities: Arc<CapabilityRegistry>,
    default_timeout: Duration,
    retry_policy: RetryPolicy,
    execution_id: String,
}

impl ExecutionDriver {
    async fn run(self) {
        {
            let mut execution = self.entry.execution.write().await;
            execution.status = ExecutionStatus::Running;
            execution.started_at = Some(Utc::now());
        }

        let total = self.definition.steps.len();
        let mut executed: HashSet<String> = HashSet::with_capacity(total);

        while executed.len() < total {
            if self.entry.abort.is_aborted() {
                info!("Execution {} cancelled, stopping round loop", self.execution_id);
                return;
            }

            // Readiness: not yet executed, all dependencies executed.
            let ready: Vec<&WorkflowStep> = self
                .definition
                .steps
                .iter()
                .filter(|step| !executed.contains(&step.name))
                .filter(|step| step.depends_on.iter().all(|dep| executed.contains(dep)))
                .collect();

            if ready.is_empty() {
                let deadlock = ExecutionError::DeadlockDetected;
                error!("Execution {}: {}", self.execution_id, deadlock);
                self.fail(deadlock).await;
                return;
            }

            // Conditions and templates see results from prior rounds only;
            // steps within one round are unordered relative to each other.
            let (results, metadata) = {
                let execution = self.entry.execution.read().await;
                (execution.results.clone(), execution.metadata.clone())
            };

            debug!(
                "Execution {}: dispatching round of {} step(s)",
                self.execution_id,
                ready.len()
            );

            let outcomes = join_all(
                ready
                    .iter()
                    .map(|step| self.run_step(step, &results, &metadata)),
            )
            .await;

            let mut execution = self.entry.execution.write().await;
            if execution.status != ExecutionStatus::Running {
                // Cancelled while the round was in flight; the record is
                // terminal and must not change.
                return;
            }

            let mut failure: Option<(String, ExecutionError)> = None;
            for outcome in outcomes {
                match outcome {
                    StepOutcome::Finished { step, result } => {
                        execution.results.insert(step.clone(), result);
                        executed.insert(step);
                    }
                    StepOutcome::Failed { step, error } => {
                        if failure.is_none() {
                            failure = Some((step, error));
                        }
                    }
                }
            }

            if let Some((step, error)) = failure {
                error!(
                    "Execution {} aborted: step '{}' failed: {}",
                    self.execution_id, step, error
                );
                execution.errors.push(error.to_string());
                execution.status = ExecutionStatus::Failed;
                execution.ended_at = Some(Utc::now());
                return;
            }
        }

        let mut execution = self.entry.execution.write().await;
        if execution.status == ExecutionStatus::Running {
            execution.status = ExecutionStatus::Completed;
            execution.ended_at = Some(Utc::now());
            info!("Workflow execution completed: {}", self.execution_id);
        }
    }

    /// Record a failure for errors raised outside step processing.
    async fn fail(&self, error: ExecutionError) {
        let mut execution = self.entry.execution.write().await;
        if execution.status != ExecutionStatus::Running {
            return;
        }
        execution.errors.push(error.to_string());
        execution.status = ExecutionStatus::Failed;
        execution.ended_at = Some(Utc::now());
    }

    /// Execute one step: condition, binding, invocation, validation.
    async fn run_step(
        &self,
        step: &WorkflowStep,
        results: &Map<String, Value>,
        metadata: &Value,
    ) -> StepOutcome {
        debug!("Executing step: {} ({})", step.name, step.capability);

        if let Some(source) = &step.condition {
            match Condition::parse(source).and_then(|c| c.evaluate(results)) {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Skipping step '{}': condition not met", step.name);
                    return StepOutcome::Finished {
                        step: step.name.clone(),
                        result: json!({"status": "skipped", "reason": "condition not met"}),
                    };
                }
                Err(e) => {
                    // A broken condition skips the step rather than
                    // failing the execution.
                    warn!(
                        "Skipping step '{}': condition evaluation failed: {}",
                        step.name, e
                    );
                    return StepOutcome::Finished {
                        step: step.name.clone(),
                        result: json!({
                            "status": "skipped",
                            "reason": format!("condition evaluation failed: {e}"),
                        }),
                    };
                }
            }
        }

        let params = bind_parameters(&step.parameters, &BindContext { results, metadata });

        let Some(capability) = self.capabilities.get(&step.capability) else {
            return StepOutcome::Failed {
                step: step.name.clone(),
                error: ExecutionError::StepExecutionError {
                    step: step.name.clone(),
                    reason: format!("unknown capability '{}'", step.capability),
                },
            };
        };

        let timeout = step
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);

        let mut attempt: u32 = 0;
        let result = loop {
            match self
                .invoke(capability.as_ref(), step, params.clone(), timeout)
                .await
            {
                Ok(result) => break result,
                Err(error) => {
                    if attempt >= step.max_retries || self.entry.abort.is_aborted() {
                        return StepOutcome::Failed {
                            step: step.name.clone(),
                            error,
                        };
                    }
                    let delay = self.retry_policy.delay(attempt);
                    warn!(
                        "Step '{}' attempt {} failed ({}), retrying in {:?}",
                        step.name,
                        attempt + 1,
                        error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        };

        if let Some(rules) = &step.validation {
            if let Err(reason) = validate_result(&result, rules) {
                return StepOutcome::Failed {
                    step: step.name.clone(),
                    error: ExecutionError::StepValidationFailed {
                        step: step.name.clone(),
                        reason,
                    },
                };
            }
        }

        debug!("Step completed: {}", step.name);
        StepOutcome::Finished {
            step: step.name.clone(),
            result,
        }
    }

    /// Invoke the capability under the step's timeout.
    async fn invoke(
        &self,
        capability: &dyn Capability,
        step: &WorkflowStep,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, ExecutionError> {
        let ctx = CapabilityContext::new(self.execution_id.as_str(), step.name.as_str())
            .with_abort_signal(self.entry.abort.clone());

        match tokio::time::timeout(timeout, capability.invoke(params, ctx)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(ExecutionError::StepExecutionError {
                step: step.name.clone(),
                reason: e.to_string(),
            }),
            Err(_) => Err(ExecutionError::StepTimeout {
                step: step.name.clone(),
                seconds: timeout.as_secs(),
            }),
        }
    }
}
