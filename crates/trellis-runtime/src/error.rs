//! Runtime errors.

use thiserror::Error;

use trellis_config::ValidationError;
use trellis_graph::PlanError;

/// Failure reported by an external executor.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The execution runtime does not know the operation.
  #[error("unknown operation: {0}")]
  UnknownOperation(String),

  /// The template executor does not know the template.
  #[error("unknown template: {name}@{version}")]
  UnknownTemplate { name: String, version: String },

  /// The work itself failed.
  #[error("{0}")]
  Failed(String),
}

/// Why a single task failed. Task failures are localized: they fail the
/// task and its dependents, not the coordinator.
#[derive(Debug, Error)]
pub enum TaskError {
  /// A bound value failed the implementation's input validation.
  #[error("failed to bind parameter '{parameter}': {source}")]
  Binding {
    parameter: String,
    #[source]
    source: ValidationError,
  },

  /// A binding points at an artifact the predecessor never produced.
  #[error("upstream artifact '{output}' of task '{task}' is unavailable")]
  MissingUpstream { task: String, output: String },

  /// The executor returned without producing a declared output.
  #[error("declared output '{output}' was not produced")]
  MissingArtifact { output: String },

  /// The external executor failed.
  #[error(transparent)]
  Execute(#[from] ExecuteError),
}

/// Errors that abort a run outright.
///
/// Structural and input errors are raised before any task is dispatched;
/// store errors and cancellation can interrupt a run in flight.
#[derive(Debug, Error)]
pub enum RunError {
  /// A supplied input value failed validation.
  #[error(transparent)]
  Validation(#[from] ValidationError),

  /// The graph could not be resolved into a plan.
  #[error(transparent)]
  Plan(#[from] PlanError),

  /// The run store failed.
  #[error("store error: {0}")]
  Store(#[from] trellis_store::Error),

  /// The persisted input record is not a JSON object.
  #[error("run '{run_id}' has a corrupt input record")]
  CorruptRun { run_id: String },

  /// The run record belongs to a different workflow.
  #[error("run '{run_id}' belongs to workflow '{actual}', not '{expected}'")]
  WorkflowMismatch {
    run_id: String,
    expected: String,
    actual: String,
  },

  /// A spawned task panicked or was aborted.
  #[error("task join error: {message}")]
  Join { message: String },

  /// Execution was cancelled.
  #[error("execution cancelled")]
  Cancelled,
}
