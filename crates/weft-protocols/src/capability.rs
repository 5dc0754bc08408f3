//! Capability trait definition.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CapabilityError;

/// Signal for cooperatively aborting an in-flight invocation.
///
/// Cancelling an execution trips the signal; a well-behaved capability may
/// poll it and return early. Interruption is never forced.
pub struct AbortSignal {
    aborted: AtomicBool,
}

impl AbortSignal {
    /// Create a new, untripped signal.
    pub fn new() -> Self {
        Self {
            aborted: AtomicBool::new(false),
        }
    }

    /// Trip the signal.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Relaxed);
    }

    /// Check whether the signal has been tripped.
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Relaxed)
    }
}

impl Default for AbortSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Context for a capability invocation.
#[derive(Clone)]
pub struct CapabilityContext {
    /// Id of the execution this invocation belongs to.
    pub execution_id: String,

    /// Name of the step being executed.
    pub step_name: String,

    /// Abort signal for cooperative cancellation.
    pub abort_signal: Arc<AbortSignal>,
}

impl CapabilityContext {
    /// Create a new invocation context.
    pub fn new(execution_id: impl Into<String>, step_name: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            step_name: step_name.into(),
            abort_signal: Arc::new(AbortSignal::new()),
        }
    }

    /// Attach a shared abort signal.
    pub fn with_abort_signal(mut self, signal: Arc<AbortSignal>) -> Self {
        self.abort_signal = signal;
        self
    }

    /// Check if the invocation should be aborted.
    pub fn is_aborted(&self) -> bool {
        self.abort_signal.is_aborted()
    }
}

/// Core trait for capabilities.
///
/// Capabilities are the external operations workflow steps invoke. An
/// invocation receives the step's bound parameters and returns a result
/// record: a JSON object that always carries a `status` field, either
/// `"success"` or `"error"`, plus an arbitrary payload.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Unique name used to resolve this capability from a step.
    fn name(&self) -> &str;

    /// Invoke the capability with the given parameters.
    async fn invoke(
        &self,
        params: serde_json::Value,
        ctx: CapabilityContext,
    ) -> Result<serde_json::Value, CapabilityError>;
}
