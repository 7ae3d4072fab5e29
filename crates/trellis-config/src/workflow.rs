use serde::{Deserialize, Serialize};

use crate::output::OutputSpec;
use crate::spec::InputSpec;
use crate::task::TaskDef;

/// A complete workflow declaration.
///
/// This is the serializable artifact an author writes. Task order is
/// significant: it is the deterministic tie-break when the plan resolver
/// orders tasks that are simultaneously runnable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub workflow_id: String,
  pub name: String,
  #[serde(default)]
  pub inputs: Vec<InputSpec>,
  #[serde(default)]
  pub outputs: Vec<OutputSpec>,
  pub tasks: Vec<TaskDef>,
}

#[cfg(test)]
mod tests {
  use super::*;

  const FIXTURE: &str = r#"{
    "workflow_id": "annual-daylight",
    "name": "Annual Daylight",
    "inputs": [
      {
        "name": "north",
        "kind": "number",
        "description": "Rotation from north.",
        "default": 0,
        "minimum": 0,
        "maximum": 360,
        "alias": "north_input"
      },
      {
        "name": "model",
        "kind": "file",
        "extensions": ["json", "hbjson"]
      }
    ],
    "outputs": [
      {
        "name": "results",
        "kind": "folder",
        "source": { "type": "path", "path": "results" }
      },
      {
        "name": "summary",
        "kind": "folder",
        "source": { "type": "task", "task": "postprocess", "output": "summary" }
      }
    ],
    "tasks": [
      {
        "task_id": "raytrace",
        "type": "template",
        "name": "daylight-coefficient",
        "version": "1.0.0",
        "params": {
          "north": { "type": "input", "input": "north" },
          "model": { "type": "input", "input": "model" }
        },
        "needs": []
      },
      {
        "task_id": "postprocess",
        "type": "operation",
        "operation": "summarize",
        "produces": ["raw_summary"],
        "params": {
          "folder": { "type": "literal", "value": "results" },
          "grids": { "type": "task_output", "task": "raytrace", "output": "grids" }
        },
        "needs": ["raytrace"],
        "outputs": [{ "from": "raw_summary", "to": "summary" }]
      }
    ]
  }"#;

  #[test]
  fn definition_round_trips_losslessly() {
    let def: WorkflowDef = serde_json::from_str(FIXTURE).unwrap();

    let encoded = serde_json::to_string(&def).unwrap();
    let decoded: WorkflowDef = serde_json::from_str(&encoded).unwrap();

    assert_eq!(def, decoded);
  }

  #[test]
  fn binding_variants_deserialize() {
    let def: WorkflowDef = serde_json::from_str(FIXTURE).unwrap();

    let postprocess = &def.tasks[1];
    assert!(matches!(
      postprocess.params.get("folder"),
      Some(crate::BindingDef::Literal { .. })
    ));
    assert!(matches!(
      postprocess.params.get("grids"),
      Some(crate::BindingDef::TaskOutput { task, output })
        if task == "raytrace" && output == "grids"
    ));
  }

  #[test]
  fn alias_survives_round_trip_untouched() {
    let def: WorkflowDef = serde_json::from_str(FIXTURE).unwrap();
    assert_eq!(def.inputs[0].alias.as_deref(), Some("north_input"));

    let encoded = serde_json::to_value(&def).unwrap();
    assert_eq!(encoded["inputs"][0]["alias"], "north_input");
  }
}
