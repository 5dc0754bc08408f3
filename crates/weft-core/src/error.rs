//! Engine error types.

use thiserror::Error;

/// Errors returned synchronously when registering workflows or capabilities.
///
/// A failed registration leaves the registry unchanged.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A workflow with this name already exists.
    #[error("Workflow already registered: {0}")]
    DuplicateWorkflow(String),

    /// The step list was empty.
    #[error("Workflow '{0}' must contain at least one step")]
    EmptyWorkflow(String),

    /// Two steps share a name.
    #[error("Workflow '{workflow}' declares step '{step}' more than once")]
    DuplicateStepName { workflow: String, step: String },

    /// A dependency names a step absent from the workflow.
    #[error("Step '{step}' in workflow '{workflow}' depends on unknown step '{dependency}'")]
    UnknownDependency {
        workflow: String,
        step: String,
        dependency: String,
    },

    /// The dependency graph contains a cycle.
    #[error("Workflow '{workflow}' has a cyclic dependency through step '{step}'")]
    CyclicDependency { workflow: String, step: String },

    /// A capability with this name already exists.
    #[error("Capability already registered: {0}")]
    DuplicateCapability(String),
}

/// Errors surfaced while starting or driving an execution.
///
/// Only `WorkflowNotFound` reaches the caller of `execute`; the rest are
/// recorded into the execution's error list and observed by polling.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// No workflow registered under the requested name.
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    /// No step was ready and the workflow is not finished.
    #[error("No steps ready to execute - dependency deadlock")]
    DeadlockDetected,

    /// A result record violated the step's validation rules.
    #[error("Step '{step}' result validation failed: {reason}")]
    StepValidationFailed { step: String, reason: String },

    /// The capability reported an error or could not be resolved.
    #[error("Step '{step}' execution failed: {reason}")]
    StepExecutionError { step: String, reason: String },

    /// The capability did not return within the step's timeout.
    #[error("Step '{step}' timed out after {seconds} seconds")]
    StepTimeout { step: String, seconds: u64 },
}
