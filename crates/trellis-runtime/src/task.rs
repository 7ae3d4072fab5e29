use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use trellis_config::{Artifact, BindingDef, resolve_workflow_inputs};
use trellis_graph::{TaskKind, TaskNode};

use crate::error::TaskError;
use crate::executor::{OperationRuntime, TemplateExecutor};

/// Result of one executed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
  pub task_id: String,
  /// The parameter values the implementation actually received.
  pub resolved_inputs: HashMap<String, serde_json::Value>,
  /// Produced artifacts under their exposed names.
  pub outputs: HashMap<String, Artifact>,
}

/// Bind a task's parameters from the run's resolved inputs and the results
/// of its predecessors.
pub(crate) fn bind_params(
  node: &TaskNode,
  workflow_inputs: &HashMap<String, serde_json::Value>,
  completed: &HashMap<String, TaskResult>,
) -> Result<HashMap<String, serde_json::Value>, TaskError> {
  let mut bound = HashMap::new();

  for (parameter, binding) in &node.params {
    match binding {
      BindingDef::Literal { value } => {
        bound.insert(parameter.clone(), value.clone());
      }
      BindingDef::Input { input } => {
        // An optional workflow input may be absent; the implementation's
        // own default applies in that case.
        if let Some(value) = workflow_inputs.get(input) {
          bound.insert(parameter.clone(), value.clone());
        }
      }
      BindingDef::TaskOutput { task, output } => {
        let artifact = completed
          .get(task)
          .and_then(|result| result.outputs.get(output))
          .ok_or_else(|| TaskError::MissingUpstream {
            task: task.clone(),
            output: output.clone(),
          })?;
        bound.insert(parameter.clone(), artifact.to_value());
      }
    }
  }

  Ok(bound)
}

/// Validate bound parameters against the implementation's schema and
/// dispatch to the matching executor. Produced artifacts come back under
/// the task's exposed names.
pub(crate) async fn execute_task(
  node: &TaskNode,
  bound: HashMap<String, serde_json::Value>,
  templates: &dyn TemplateExecutor,
  operations: &dyn OperationRuntime,
) -> Result<TaskResult, TaskError> {
  let (resolved, produced) = match &node.kind {
    TaskKind::Template(locked) => {
      let resolved = resolve_workflow_inputs(&locked.schema.inputs, &bound).map_err(|source| {
        TaskError::Binding {
          parameter: source.input().to_string(),
          source,
        }
      })?;
      let produced = templates.execute(locked, resolved.clone()).await?;
      (resolved, produced)
    }
    TaskKind::Operation { operation, .. } => {
      let produced = operations.run(operation, bound.clone()).await?;
      (bound, produced)
    }
  };

  // Every declared output must be present; renames give the exposed names.
  let declared = node.declared_outputs();
  let mut outputs = HashMap::new();
  for name in &declared {
    let artifact = produced.get(*name).ok_or_else(|| TaskError::MissingArtifact {
      output: name.to_string(),
    })?;
    outputs.insert(node.exposed_name(name).to_string(), artifact.clone());
  }

  // Undeclared extras pass through under their own names.
  for (name, artifact) in produced {
    if !declared.contains(&name.as_str()) {
      outputs.entry(name).or_insert(artifact);
    }
  }

  Ok(TaskResult {
    task_id: node.task_id.clone(),
    resolved_inputs: resolved,
    outputs,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::path::PathBuf;

  fn operation_node(id: &str, params: Vec<(&str, BindingDef)>) -> TaskNode {
    TaskNode {
      task_id: id.to_string(),
      kind: TaskKind::Operation {
        operation: "noop".to_string(),
        produces: vec![],
      },
      params: params
        .into_iter()
        .map(|(name, binding)| (name.to_string(), binding))
        .collect(),
      needs: vec![],
      outputs: vec![],
    }
  }

  #[test]
  fn literal_and_input_bindings_resolve() {
    let node = operation_node(
      "task",
      vec![
        ("folder", BindingDef::Literal { value: json!("results") }),
        ("north", BindingDef::Input { input: "north".to_string() }),
      ],
    );
    let inputs = HashMap::from([("north".to_string(), json!(90))]);

    let bound = bind_params(&node, &inputs, &HashMap::new()).unwrap();
    assert_eq!(bound.get("folder"), Some(&json!("results")));
    assert_eq!(bound.get("north"), Some(&json!(90)));
  }

  #[test]
  fn absent_optional_input_is_left_unbound() {
    let node = operation_node(
      "task",
      vec![("schedule", BindingDef::Input { input: "schedule".to_string() })],
    );

    let bound = bind_params(&node, &HashMap::new(), &HashMap::new()).unwrap();
    assert!(!bound.contains_key("schedule"));
  }

  #[test]
  fn upstream_artifact_binds_as_value() {
    let node = operation_node(
      "task",
      vec![(
        "grids",
        BindingDef::TaskOutput {
          task: "raytrace".to_string(),
          output: "grids".to_string(),
        },
      )],
    );

    let completed = HashMap::from([(
      "raytrace".to_string(),
      TaskResult {
        task_id: "raytrace".to_string(),
        resolved_inputs: HashMap::new(),
        outputs: HashMap::from([(
          "grids".to_string(),
          Artifact::Folder {
            path: PathBuf::from("/work/grids"),
          },
        )]),
      },
    )]);

    let bound = bind_params(&node, &HashMap::new(), &completed).unwrap();
    assert_eq!(bound.get("grids"), Some(&json!("/work/grids")));
  }

  #[test]
  fn missing_upstream_artifact_is_an_error() {
    let node = operation_node(
      "task",
      vec![(
        "grids",
        BindingDef::TaskOutput {
          task: "raytrace".to_string(),
          output: "grids".to_string(),
        },
      )],
    );

    let result = bind_params(&node, &HashMap::new(), &HashMap::new());
    assert!(matches!(
      result,
      Err(TaskError::MissingUpstream { task, .. }) if task == "raytrace"
    ));
  }
}
