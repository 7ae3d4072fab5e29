use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A produced artifact: a scalar value, a file, or an opaque folder.
///
/// Folder artifacts are first-class. The engine never looks inside them; it
/// only carries their location from the producing task to whatever binds or
/// forwards them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Artifact {
  Value { value: serde_json::Value },
  File { path: PathBuf },
  Folder { path: PathBuf },
}

impl Artifact {
  /// The artifact as a bindable parameter value. Paths bind as strings.
  pub fn to_value(&self) -> serde_json::Value {
    match self {
      Artifact::Value { value } => value.clone(),
      Artifact::File { path } | Artifact::Folder { path } => {
        serde_json::Value::String(path.display().to_string())
      }
    }
  }
}
