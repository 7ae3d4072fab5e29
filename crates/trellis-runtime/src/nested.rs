//! Recursive template execution over nested workflow graphs.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use trellis_config::Artifact;
use trellis_graph::{LockedTemplate, WorkflowGraph};
use trellis_store::{RunStatus, RunStore};

use crate::coordinator::{Coordinator, CoordinatorConfig};
use crate::error::ExecuteError;
use crate::executor::{OperationRuntime, TemplateExecutor};
use crate::forward;

/// Executes template-backed tasks by running another workflow graph.
///
/// Here a template is not a remote black box: it is a nested
/// `WorkflowGraph` sharing the same entity model. Template tasks inside a
/// nested graph resolve against this executor again, so composition nests
/// to arbitrary depth without special cases.
///
/// A template reference resolves to the registered graph whose
/// `workflow_id` equals the template name; the registry schema a task was
/// built against is expected to mirror the inner graph's boundary specs.
#[derive(Clone)]
pub struct NestedWorkflowExecutor {
  graphs: Arc<HashMap<String, Arc<WorkflowGraph>>>,
  operations: Arc<dyn OperationRuntime>,
  store: Arc<dyn RunStore>,
  config: CoordinatorConfig,
  work_dir: PathBuf,
}

impl NestedWorkflowExecutor {
  pub fn new(
    graphs: impl IntoIterator<Item = Arc<WorkflowGraph>>,
    operations: Arc<dyn OperationRuntime>,
    store: Arc<dyn RunStore>,
    config: CoordinatorConfig,
    work_dir: impl Into<PathBuf>,
  ) -> Self {
    let graphs = graphs
      .into_iter()
      .map(|graph| (graph.workflow_id.clone(), graph))
      .collect();

    Self {
      graphs: Arc::new(graphs),
      operations,
      store,
      config,
      work_dir: work_dir.into(),
    }
  }
}

#[async_trait]
impl TemplateExecutor for NestedWorkflowExecutor {
  async fn execute(
    &self,
    template: &LockedTemplate,
    inputs: HashMap<String, serde_json::Value>,
  ) -> Result<HashMap<String, Artifact>, ExecuteError> {
    let graph = self
      .graphs
      .get(&template.name)
      .ok_or_else(|| ExecuteError::UnknownTemplate {
        name: template.name.clone(),
        version: template.version.clone(),
      })?;

    let coordinator = Coordinator::new(
      graph.clone(),
      Arc::new(self.clone()),
      self.operations.clone(),
      self.store.clone(),
      self.config.clone(),
    )
    .map_err(|e| ExecuteError::Failed(e.to_string()))?;

    let outcome = coordinator
      .execute(inputs, CancellationToken::new())
      .await
      .map_err(|e| ExecuteError::Failed(e.to_string()))?;

    if outcome.status != RunStatus::Succeeded {
      return Err(ExecuteError::Failed(format!(
        "nested workflow '{}' failed",
        template.name
      )));
    }

    forward::forward(graph, &self.work_dir, &outcome.results)
      .map_err(|e| ExecuteError::Failed(e.to_string()))
  }
}
