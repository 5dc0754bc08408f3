//! Workflow definitions and execution records.

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Rules applied to a step's result record after its capability returns.
///
/// Both rules are optional and checked independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Keys that must be present in the result record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<String>,

    /// Required value of the result's `status` field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_status: Option<String>,
}

impl ValidationRules {
    /// Create empty rules (always validate).
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the listed keys to exist in the result.
    pub fn require_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Require the result's `status` field to equal the given value.
    pub fn expect_status(mut self, status: impl Into<String>) -> Self {
        self.expected_status = Some(status.into());
        self
    }
}

/// A single unit of work in a workflow.
///
/// Immutable once its workflow is registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Step name, unique within its workflow.
    pub name: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Name of the capability this step invokes.
    pub capability: String,

    /// Invocation parameters. String values of the exact form
    /// `{{ name }}` are bound against prior results and metadata.
    #[serde(default)]
    pub parameters: Map<String, Value>,

    /// Result validation rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,

    /// Bounded retries for capability errors and timeouts.
    #[serde(default)]
    pub max_retries: u32,

    /// Per-step invocation timeout in seconds; engine default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Names of steps that must finish before this one is dispatched.
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Optional run condition over prior results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl WorkflowStep {
    /// Create a new step invoking the named capability.
    pub fn new(name: impl Into<String>, capability: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            capability: capability.into(),
            parameters: Map::new(),
            validation: None,
            max_retries: 0,
            timeout_secs: None,
            depends_on: Vec::new(),
            condition: None,
        }
    }

    /// Set description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a single invocation parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Replace all invocation parameters.
    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set result validation rules.
    pub fn with_validation(mut self, rules: ValidationRules) -> Self {
        self.validation = Some(rules);
        self
    }

    /// Set retry budget for capability errors and timeouts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the per-step timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Declare dependencies on other steps of the same workflow.
    pub fn with_depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Set the run condition.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// A named workflow: an ordered list of steps forming a dependency graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Workflow name.
    pub name: String,

    /// Steps in declaration order.
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowDefinition {
    /// Create a new definition.
    pub fn new(name: impl Into<String>, steps: Vec<WorkflowStep>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    /// Find a step by name.
    pub fn step(&self, name: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// Workflow execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Created, loop not yet started.
    Pending,
    /// Round loop in progress.
    Running,
    /// Every step executed (run or skipped).
    Completed,
    /// Aborted on a fatal step error or deadlock.
    Failed,
    /// Cancelled by an explicit request.
    Cancelled,
}

impl ExecutionStatus {
    /// Whether the record can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Cancelled
        )
    }
}

/// One run instance of a workflow.
///
/// Once the status is terminal the record is immutable except for reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecution {
    /// Globally unique execution id.
    pub id: String,

    /// Name of the workflow being run.
    pub workflow_name: String,

    /// Current status.
    pub status: ExecutionStatus,

    /// Step results keyed by step name; insertion order is completion order.
    #[serde(default)]
    pub results: Map<String, Value>,

    /// Failure messages, in the order they occurred.
    #[serde(default)]
    pub errors: Vec<String>,

    /// When the round loop started.
    pub started_at: Option<DateTime<Utc>>,

    /// When the execution reached a terminal status.
    pub ended_at: Option<DateTime<Utc>>,

    /// Caller-supplied initial data; read-only context for templating.
    #[serde(default)]
    pub metadata: Value,
}

impl WorkflowExecution {
    /// Create a new pending execution.
    pub fn new(
        id: impl Into<String>,
        workflow_name: impl Into<String>,
        metadata: Value,
    ) -> Self {
        Self {
            id: id.into(),
            workflow_name: workflow_name.into(),
            status: ExecutionStatus::Pending,
            results: Map::new(),
            errors: Vec::new(),
            started_at: None,
            ended_at: None,
            metadata,
        }
    }
}
