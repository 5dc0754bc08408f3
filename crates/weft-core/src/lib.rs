//! # Weft Core
//!
//! Round-based workflow orchestration engine.
//!
//! A workflow is a named dependency graph of steps, each invoking an
//! external [`Capability`] with templated parameters. The engine validates
//! workflows at registration (unique step names, resolvable dependencies,
//! no cycles), then executes them asynchronously: every step whose
//! dependencies are satisfied is dispatched concurrently in the current
//! round, and the next round starts once the whole round finishes. Callers
//! get an execution id back immediately and poll the engine for status.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use weft_core::{CapabilityRegistry, MockCapability, WorkflowEngine, WorkflowStep};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let capabilities = Arc::new(CapabilityRegistry::new());
//! capabilities.register(Arc::new(MockCapability::new("fetch_inbox")))?;
//! capabilities.register(Arc::new(MockCapability::new("sendmail")))?;
//!
//! let engine = WorkflowEngine::new(capabilities);
//! engine
//!     .register_workflow(
//!         "notify",
//!         vec![
//!             WorkflowStep::new("fetch", "fetch_inbox"),
//!             WorkflowStep::new("send", "sendmail")
//!                 .with_depends_on(["fetch"])
//!                 .with_parameter("summary", json!("{{ fetch.summary }}"))
//!                 .with_condition("results.fetch.status == \"success\""),
//!         ],
//!     )
//!     .await?;
//!
//! let id = engine.execute("notify", json!({"recipient": "ops@example.com"})).await?;
//! let snapshot = engine.execution_status(&id).await;
//! # Ok(())
//! # }
//! ```

pub mod condition;
pub mod definition;
pub mod error;
pub mod executor;
pub mod mock;
pub mod registry;
pub mod retry;
pub mod store;

mod template;
mod validate;
mod validation;

pub use condition::{Condition, ConditionError};
pub use definition::{
    ExecutionStatus, ValidationRules, WorkflowDefinition, WorkflowExecution, WorkflowStep,
};
pub use error::{ExecutionError, RegistryError};
pub use executor::WorkflowEngine;
pub use mock::MockCapability;
pub use registry::{CapabilityRegistry, WorkflowRegistry};
pub use retry::RetryPolicy;
pub use store::ExecutionStore;

// Re-export the capability contract so embedders depend on one crate.
pub use weft_protocols::{AbortSignal, Capability, CapabilityContext, CapabilityError};
