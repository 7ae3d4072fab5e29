//! Output forwarding at the workflow boundary.
//!
//! After a run finishes, each declared workflow output is mapped to the
//! artifact that fulfills it: either an artifact exposed by a task, or a
//! literal path inside the working area. An output whose producing task did
//! not complete is reported as unresolved, never silently omitted.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use trellis_config::{Artifact, OutputSource, ValueKind};
use trellis_graph::WorkflowGraph;

use crate::task::TaskResult;

/// A workflow output that could not be mapped to an artifact.
#[derive(Debug, Error)]
pub enum ForwardError {
  /// The producing task did not complete (failed or skipped upstream).
  #[error("workflow output '{output}' is unresolved: task '{task}' did not complete")]
  UnresolvedOutput { output: String, task: String },

  /// The producing task completed but exposed no artifact under the name.
  #[error("workflow output '{output}' is unresolved: task '{task}' exposed no artifact '{artifact}'")]
  MissingArtifact {
    output: String,
    task: String,
    artifact: String,
  },
}

/// Map every declared workflow output to its artifact location.
pub fn forward(
  graph: &WorkflowGraph,
  work_dir: &Path,
  results: &HashMap<String, TaskResult>,
) -> Result<HashMap<String, Artifact>, ForwardError> {
  let mut outputs = HashMap::new();

  for spec in &graph.outputs {
    let artifact = match &spec.source {
      OutputSource::Task { task, output } => {
        let result = results.get(task).ok_or_else(|| ForwardError::UnresolvedOutput {
          output: spec.name.clone(),
          task: task.clone(),
        })?;

        result
          .outputs
          .get(output)
          .cloned()
          .ok_or_else(|| ForwardError::MissingArtifact {
            output: spec.name.clone(),
            task: task.clone(),
            artifact: output.clone(),
          })?
      }
      OutputSource::Path { path } => {
        let location = work_dir.join(path);
        match spec.kind {
          ValueKind::Folder => Artifact::Folder { path: location },
          _ => Artifact::File { path: location },
        }
      }
    };

    outputs.insert(spec.name.clone(), artifact);
  }

  Ok(outputs)
}
