use serde::{Deserialize, Serialize};

use trellis_config::{InputSpec, OutputSpec};

use crate::graph::Graph;
use crate::node::TaskNode;

/// A built workflow ready for planning and execution.
///
/// Tasks keep their declaration order; the plan resolver uses it as the
/// deterministic tie-break. The graph itself is immutable after build and
/// holds no execution state, so a single instance serves many runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
  pub workflow_id: String,
  pub name: String,
  pub inputs: Vec<InputSpec>,
  pub outputs: Vec<OutputSpec>,
  pub tasks: Vec<TaskNode>,
}

impl WorkflowGraph {
  /// Build the adjacency structure for traversal.
  pub fn graph(&self) -> Graph {
    Graph::new(&self.tasks)
  }

  /// Get a task by id.
  pub fn task(&self, task_id: &str) -> Option<&TaskNode> {
    self.tasks.iter().find(|task| task.task_id == task_id)
  }
}
