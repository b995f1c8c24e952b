//! Collaborators of one loop run

use std::sync::Arc;

use crate::gateway::ModelGateway;
use crate::logging::{Logger, NoOpLogger};
use crate::tools::ToolRegistry;

use super::sink::OutputSink;

/// Everything a loop run talks to, passed explicitly instead of held in
/// globals. Cloning shares the collaborators.
#[derive(Clone)]
pub struct LoopContext {
    pub gateway: Arc<dyn ModelGateway>,
    pub registry: Arc<dyn ToolRegistry>,
    pub sink: Arc<dyn OutputSink>,
    pub logger: Arc<dyn Logger>,
}

impl LoopContext {
    /// Context with a silent logger
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        registry: Arc<dyn ToolRegistry>,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            gateway,
            registry,
            sink,
            logger: Arc::new(NoOpLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }
}

impl std::fmt::Debug for LoopContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopContext")
            .field("gateway", &self.gateway.name())
            .finish_non_exhaustive()
    }
}
