//! In-memory tool registry

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::types::{CancellationToken, ToolDescriptor, ToolOutput};

use super::traits::{ToolError, ToolRegistry, ToolRegistryResult};

type Handler = Arc<dyn Fn(Value) -> BoxFuture<'static, ToolRegistryResult<ToolOutput>> + Send + Sync>;

/// Tool registry holding closures, for tests and for embedding local tools
#[derive(Default)]
pub struct MemoryToolRegistry {
    tools: RwLock<Vec<(ToolDescriptor, Handler)>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MemoryToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async tool; a tool with the same name is replaced
    pub fn register<F, Fut>(&self, descriptor: ToolDescriptor, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolRegistryResult<ToolOutput>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |input| handler(input).boxed());
        let mut tools = self.tools.write();
        tools.retain(|(d, _)| d.name != descriptor.name);
        tools.push((descriptor, handler));
    }

    /// Register a synchronous tool
    pub fn register_fn<F>(&self, descriptor: ToolDescriptor, handler: F)
    where
        F: Fn(Value) -> ToolRegistryResult<ToolOutput> + Send + Sync + 'static,
    {
        self.register(descriptor, move |input| {
            let result = handler(input);
            async move { result }
        });
    }

    /// Names and inputs of every invocation so far, in order
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    /// Number of invocations so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ToolRegistry for MemoryToolRegistry {
    async fn list(&self) -> ToolRegistryResult<Vec<ToolDescriptor>> {
        Ok(self.tools.read().iter().map(|(d, _)| d.clone()).collect())
    }

    async fn invoke(
        &self,
        name: &str,
        input: Value,
        cancel: &CancellationToken,
    ) -> ToolRegistryResult<ToolOutput> {
        if cancel.is_cancelled() {
            return Err(ToolError::Cancelled);
        }

        let handler = self
            .tools
            .read()
            .iter()
            .find(|(d, _)| d.name == name)
            .map(|(_, h)| Arc::clone(h))
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        self.calls.lock().push((name.to_string(), input.clone()));

        tokio::select! {
            result = handler(input) => result,
            _ = cancel.cancelled() => Err(ToolError::Cancelled),
        }
    }
}
