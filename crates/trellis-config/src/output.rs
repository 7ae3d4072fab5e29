use serde::{Deserialize, Serialize};

use crate::spec::ValueKind;

/// Where a workflow-level output comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputSource {
  /// An artifact exposed by a task, looked up by its exposed output name.
  Task { task: String, output: String },
  /// A literal path inside the workflow's working area.
  Path { path: String },
}

/// A named output declared at the workflow boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
  pub name: String,
  pub kind: ValueKind,
  pub source: OutputSource,
  #[serde(default)]
  pub description: String,
  /// Presentation metadata only, never consulted during resolution.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub alias: Option<String>,
}
