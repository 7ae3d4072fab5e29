use std::collections::HashMap;

use async_trait::async_trait;

use trellis_config::Artifact;
use trellis_graph::LockedTemplate;

use crate::error::ExecuteError;

/// Executes template-backed tasks.
///
/// A template is opaque to the coordinator: it observes eventual completion
/// with a full set of declared outputs, or failure. Implementations may run
/// containers, remote calls, or (see `NestedWorkflowExecutor`) another
/// workflow graph.
#[async_trait]
pub trait TemplateExecutor: Send + Sync {
  async fn execute(
    &self,
    template: &LockedTemplate,
    inputs: HashMap<String, serde_json::Value>,
  ) -> Result<HashMap<String, Artifact>, ExecuteError>;
}

/// Executes primitive operations.
#[async_trait]
pub trait OperationRuntime: Send + Sync {
  async fn run(
    &self,
    operation: &str,
    inputs: HashMap<String, serde_json::Value>,
  ) -> Result<HashMap<String, Artifact>, ExecuteError>;
}
