use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The declared source of a task parameter value.
///
/// Bindings are explicit and enum-tagged so that a definition file reads the
/// same way the builder resolves it. A `TaskOutput` binding is only legal if
/// the referenced task appears in the binding task's `needs` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BindingDef {
  /// A constant, passed through unchanged.
  Literal { value: serde_json::Value },
  /// A reference to a top-level workflow input.
  Input { input: String },
  /// An output exposed by a predecessor task.
  TaskOutput { task: String, output: String },
}

/// Renames an implementation output before it is exposed to the rest of the
/// workflow: `from` is the name in the implementation's schema, `to` is the
/// name the task exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRename {
  pub from: String,
  pub to: String,
}

/// What a task actually runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskImpl {
  /// A reusable sub-workflow template, resolved against the registry.
  Template {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
  },
  /// A primitive operation dispatched to the execution runtime.
  ///
  /// `produces` declares the artifact names the operation emits so that
  /// downstream bindings can be checked at build time.
  Operation {
    operation: String,
    #[serde(default)]
    produces: Vec<String>,
  },
}

/// A single unit of work in the workflow declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDef {
  pub task_id: String,
  #[serde(flatten)]
  pub implementation: TaskImpl,
  #[serde(default)]
  pub params: HashMap<String, BindingDef>,
  /// Explicit predecessor task ids. Ordering is derived from this list
  /// alone; parameter bindings must stay consistent with it.
  #[serde(default)]
  pub needs: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub outputs: Vec<OutputRename>,
}
