//! Capability registry.

use std::sync::Arc;

use dashmap::DashMap;

use weft_protocols::Capability;

use crate::error::RegistryError;

/// Registry of named capabilities the engine can invoke.
pub struct CapabilityRegistry {
    capabilities: DashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            capabilities: DashMap::new(),
        }
    }

    /// Register a capability under its own name.
    ///
    /// Returns an error if the name is already taken.
    pub fn register(&self, capability: Arc<dyn Capability>) -> Result<(), RegistryError> {
        let name = capability.name().to_string();
        if self.capabilities.contains_key(&name) {
            return Err(RegistryError::DuplicateCapability(name));
        }
        self.capabilities.insert(name, capability);
        Ok(())
    }

    /// Get a capability by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(name).map(|entry| entry.value().clone())
    }

    /// Check whether a capability is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// Names of all registered capabilities.
    pub fn names(&self) -> Vec<String> {
        self.capabilities
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
