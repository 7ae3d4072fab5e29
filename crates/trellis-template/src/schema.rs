use serde::{Deserialize, Serialize};

use trellis_config::{InputSpec, ValueKind};

/// An output declared by a template's schema.
///
/// Unlike a workflow-level `OutputSpec` there is no source locator: a
/// template's outputs are produced by the template itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateOutput {
  pub name: String,
  pub kind: ValueKind,
  #[serde(default)]
  pub description: String,
}

/// The fixed, enumerable schema of a template.
///
/// Execution semantics are opaque; the builder only ever reads this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSchema {
  pub name: String,
  pub version: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub inputs: Vec<InputSpec>,
  #[serde(default)]
  pub outputs: Vec<TemplateOutput>,
}

impl TemplateSchema {
  /// Look up a declared input by name.
  pub fn input(&self, name: &str) -> Option<&InputSpec> {
    self.inputs.iter().find(|spec| spec.name == name)
  }

  /// Look up a declared output by name.
  pub fn output(&self, name: &str) -> Option<&TemplateOutput> {
    self.outputs.iter().find(|output| output.name == name)
  }
}
