//! Workflow registry.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::definition::{WorkflowDefinition, WorkflowStep};
use crate::error::RegistryError;
use crate::validate::validate_definition;

/// Owns named workflow definitions.
///
/// Definitions are validated before they are stored; a failed registration
/// leaves the registry unchanged.
pub struct WorkflowRegistry {
    workflows: RwLock<HashMap<String, Arc<WorkflowDefinition>>>,
}

impl WorkflowRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            workflows: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new workflow.
    pub async fn register(
        &self,
        name: impl Into<String>,
        steps: Vec<WorkflowStep>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if steps.is_empty() {
            return Err(RegistryError::EmptyWorkflow(name));
        }

        let definition = WorkflowDefinition::new(name.clone(), steps);
        validate_definition(&definition)?;

        let mut workflows = self.workflows.write().await;
        if workflows.contains_key(&name) {
            return Err(RegistryError::DuplicateWorkflow(name));
        }

        info!(
            "Registered workflow '{}' with {} steps",
            name,
            definition.steps.len()
        );
        workflows.insert(name, Arc::new(definition));
        Ok(())
    }

    /// Look up a workflow by name.
    pub async fn lookup(&self, name: &str) -> Option<Arc<WorkflowDefinition>> {
        self.workflows.read().await.get(name).cloned()
    }

    /// Check whether a workflow is registered.
    pub async fn contains(&self, name: &str) -> bool {
        self.workflows.read().await.contains_key(name)
    }

    /// Names of all registered workflows.
    pub async fn names(&self) -> Vec<String> {
        self.workflows.read().await.keys().cloned().collect()
    }
}

impl Default for WorkflowRegistry {
    fn default() -> Self {
        Self::new()
    }
}
