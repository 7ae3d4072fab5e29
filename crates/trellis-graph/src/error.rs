use thiserror::Error;

/// Errors raised while resolving a graph into an execution plan.
#[derive(Debug, Error)]
pub enum PlanError {
  /// The graph contains a dependency cycle. The named task is the
  /// lexicographically smallest member of the cycle.
  #[error("dependency cycle through task '{task_id}'")]
  Cycle { task_id: String },

  /// A task references something that does not exist in the graph. This is
  /// a defensive re-check; the builder rejects these before a graph exists.
  #[error("task '{task_id}' references unknown {reference}")]
  DanglingReference { task_id: String, reference: String },
}
