//! Mock capability for testing.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use weft_protocols::{Capability, CapabilityContext, CapabilityError};

/// Mock capability returning a pre-configured response.
///
/// Without configuration it echoes the original orchestrator's shape:
/// `{"status": "success", "capability": <name>, "parameters": <params>}`.
pub struct MockCapability {
    name: String,
    response: RwLock<Option<Value>>,
    delay: Option<Duration>,
    error: Option<String>,
    fail_first: AtomicU32,
    invocations: AtomicUsize,
    last_params: RwLock<Option<Value>>,
}

impl MockCapability {
    /// Create a mock with the default echo response.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: RwLock::new(None),
            delay: None,
            error: None,
            fail_first: AtomicU32::new(0),
            invocations: AtomicUsize::new(0),
            last_params: RwLock::new(None),
        }
    }

    /// Always return this result record.
    pub fn with_response(self, response: Value) -> Self {
        Self {
            response: RwLock::new(Some(response)),
            ..self
        }
    }

    /// Sleep before responding.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Always fail with this message.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Fail the first `n` invocations, then respond normally.
    pub fn failing_first(self, n: u32) -> Self {
        self.fail_first.store(n, Ordering::Relaxed);
        self
    }

    /// How many times this capability has been invoked.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::Relaxed)
    }

    /// Parameters of the most recent invocation.
    pub async fn last_params(&self) -> Option<Value> {
        self.last_params.read().await.clone()
    }
}

#[async_trait]
impl Capability for MockCapability {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        params: Value,
        _ctx: CapabilityContext,
    ) -> Result<Value, CapabilityError> {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        *self.last_params.write().await = Some(params.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.error {
            return Err(CapabilityError::InvocationFailed(message.clone()));
        }

        if self
            .fail_first
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(CapabilityError::InvocationFailed(
                "transient failure".to_string(),
            ));
        }

        let response = self.response.read().await.clone();
        Ok(response.unwrap_or_else(|| {
            json!({
                "status": "success",
                "capability": self.name,
                "parameters": params,
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_echo_response() {
        let mock = MockCapability::new("count_r");
        let ctx = CapabilityContext::new("exec-1", "step-1");
        let result = mock.invoke(json!({"word": "berry"}), ctx).await.unwrap();

        assert_eq!(result["status"], "success");
        assert_eq!(result["capability"], "count_r");
        assert_eq!(result["parameters"]["word"], "berry");
        assert_eq!(mock.invocations(), 1);
        assert_eq!(mock.last_params().await.unwrap()["word"], "berry");
    }

    #[tokio::test]
    async fn test_configured_response() {
        let mock = MockCapability::new("fetch").with_response(json!({"status": "success", "count": 7}));
        let ctx = CapabilityContext::new("exec-1", "step-1");
        let result = mock.invoke(json!({}), ctx).await.unwrap();
        assert_eq!(result["count"], 7);
    }

    #[tokio::test]
    async fn test_error_mode() {
        let mock = MockCapability::new("broken").with_error("boom");
        let ctx = CapabilityContext::new("exec-1", "step-1");
        let err = mock.invoke(json!({}), ctx).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_failing_first_then_succeeds() {
        let mock = MockCapability::new("flaky").failing_first(2);

        for _ in 0..2 {
            let ctx = CapabilityContext::new("exec-1", "step-1");
            assert!(mock.invoke(json!({}), ctx).await.is_err());
        }
        let ctx = CapabilityContext::new("exec-1", "step-1");
        assert!(mock.invoke(json!({}), ctx).await.is_ok());
        assert_eq!(mock.invocations(), 3);
    }
}
