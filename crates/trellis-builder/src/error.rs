use thiserror::Error;

use trellis_config::ValidationError;

/// Errors that can occur while building a workflow graph.
#[derive(Debug, Error)]
pub enum BuildError {
  /// Two tasks, two specs, or two exposed outputs share a name.
  #[error("duplicate identifier: {name}")]
  DuplicateIdentifier { name: String },

  /// A parameter binding references a task that is not in the binding
  /// task's `needs` list. Ordering must be derivable from declared
  /// dependencies alone.
  #[error("task '{task_id}' binds to '{dependency}' which is not listed in its needs")]
  InconsistentDependency { task_id: String, dependency: String },

  /// A `needs` entry or binding references a task that does not exist.
  #[error("task '{task_id}' references unknown task '{dependency}'")]
  UnknownTask { task_id: String, dependency: String },

  /// A workflow output sources a task that does not exist.
  #[error("workflow output '{output}' sources unknown task '{task}'")]
  UnknownOutputSource { output: String, task: String },

  /// A binding references a task declared later in the workflow.
  #[error("task '{task_id}' binds to '{dependency}' before it is declared")]
  ForwardReference { task_id: String, dependency: String },

  /// An output name does not exist in the producer's schema.
  #[error("task '{task_id}' does not declare output '{output}'")]
  UnknownOutput { task_id: String, output: String },

  /// A binding references a top-level input that does not exist.
  #[error("task '{task_id}' binds unknown workflow input '{input}'")]
  UnknownInput { task_id: String, input: String },

  /// A parameter name is not declared by the template's schema.
  #[error("task '{task_id}' binds parameter '{parameter}' which the template does not declare")]
  UnknownParameter { task_id: String, parameter: String },

  /// A required template input has no binding and no default.
  #[error("task '{task_id}' leaves required parameter '{parameter}' unbound")]
  UnboundParameter { task_id: String, parameter: String },

  /// A literal binding fails the template input's validation rules.
  #[error("task '{task_id}' parameter '{parameter}' is invalid")]
  InvalidParameter {
    task_id: String,
    parameter: String,
    #[source]
    source: ValidationError,
  },

  /// Template not found in the registry.
  #[error("template not found: {name}")]
  TemplateNotFound { name: String },

  /// Template version not found.
  #[error("template version not found: {name}@{version}")]
  TemplateVersionNotFound { name: String, version: String },

  /// Registry error while looking up a template.
  #[error("registry error: {0}")]
  Registry(#[from] trellis_template::RegistryError),
}
