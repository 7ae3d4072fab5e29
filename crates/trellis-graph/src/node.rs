use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use trellis_config::{BindingDef, OutputRename};
use trellis_template::TemplateSchema;

/// A template reference pinned to a concrete version at build time, with the
/// schema captured so execution does not need the registry again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedTemplate {
  pub name: String,
  pub version: String,
  pub schema: TemplateSchema,
}

/// What a built task runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaskKind {
  Template(LockedTemplate),
  Operation {
    operation: String,
    produces: Vec<String>,
  },
}

/// A validated task in a built workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
  pub task_id: String,
  pub kind: TaskKind,
  pub params: HashMap<String, BindingDef>,
  pub needs: Vec<String>,
  pub outputs: Vec<OutputRename>,
}

impl TaskNode {
  /// Output names as the implementation declares them.
  pub fn declared_outputs(&self) -> Vec<&str> {
    match &self.kind {
      TaskKind::Template(locked) => locked
        .schema
        .outputs
        .iter()
        .map(|output| output.name.as_str())
        .collect(),
      TaskKind::Operation { produces, .. } => {
        produces.iter().map(|name| name.as_str()).collect()
      }
    }
  }

  /// The name a declared output is exposed under, after renames.
  pub fn exposed_name<'a>(&'a self, declared: &'a str) -> &'a str {
    self
      .outputs
      .iter()
      .find(|rename| rename.from == declared)
      .map(|rename| rename.to.as_str())
      .unwrap_or(declared)
  }

  /// Output names as the rest of the workflow sees them.
  pub fn exposed_outputs(&self) -> Vec<&str> {
    self
      .declared_outputs()
      .into_iter()
      .map(|declared| self.exposed_name(declared))
      .collect()
  }

  /// Whether the task exposes an output under the given name.
  pub fn exposes(&self, name: &str) -> bool {
    self.exposed_outputs().contains(&name)
  }
}
