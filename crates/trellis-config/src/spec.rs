use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The semantic kind of an input or output value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
  Number,
  Integer,
  String,
  File,
  Folder,
}

impl fmt::Display for ValueKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ValueKind::Number => "number",
      ValueKind::Integer => "integer",
      ValueKind::String => "string",
      ValueKind::File => "file",
      ValueKind::Folder => "folder",
    };
    f.write_str(s)
  }
}

/// A typed input declared at the workflow boundary.
///
/// The `alias` field is presentation metadata only. It is carried through
/// serialization untouched and never consulted by the builder, the plan
/// resolver, or the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
  pub name: String,
  pub kind: ValueKind,
  #[serde(default)]
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default: Option<serde_json::Value>,
  /// Inclusive lower bound for numeric kinds.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub minimum: Option<f64>,
  /// Inclusive upper bound for numeric kinds.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub maximum: Option<f64>,
  /// Allowed file extensions, matched case-insensitively. Empty = any.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub extensions: Vec<String>,
  /// Optional inputs may be left unsupplied even without a default.
  #[serde(default)]
  pub optional: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub alias: Option<String>,
}

impl InputSpec {
  /// Check a concrete value against this spec.
  pub fn validate(&self, value: &serde_json::Value) -> Result<(), ValidationError> {
    match self.kind {
      ValueKind::Number | ValueKind::Integer => self.validate_numeric(value),
      ValueKind::String => match value.as_str() {
        Some(_) => Ok(()),
        None => Err(self.wrong_kind()),
      },
      ValueKind::File => {
        let path = value.as_str().ok_or_else(|| self.wrong_kind())?;
        self.validate_extension(path)
      }
      ValueKind::Folder => match value.as_str() {
        Some(_) => Ok(()),
        None => Err(self.wrong_kind()),
      },
    }
  }

  fn validate_numeric(&self, value: &serde_json::Value) -> Result<(), ValidationError> {
    let number = match self.kind {
      ValueKind::Integer => {
        if !value.is_i64() && !value.is_u64() {
          return Err(self.wrong_kind());
        }
        value.as_f64()
      }
      _ => value.as_f64(),
    };

    let number = number.ok_or_else(|| self.wrong_kind())?;

    let minimum = self.minimum.unwrap_or(f64::NEG_INFINITY);
    let maximum = self.maximum.unwrap_or(f64::INFINITY);
    if number < minimum || number > maximum {
      return Err(ValidationError::OutOfRange {
        input: self.name.clone(),
        value: number,
        minimum,
        maximum,
      });
    }

    Ok(())
  }

  fn validate_extension(&self, path: &str) -> Result<(), ValidationError> {
    if self.extensions.is_empty() {
      return Ok(());
    }

    let lowered = path.to_ascii_lowercase();
    let matched = self
      .extensions
      .iter()
      .any(|ext| lowered.ends_with(&format!(".{}", ext.to_ascii_lowercase())));

    if matched {
      Ok(())
    } else {
      Err(ValidationError::UnsupportedExtension {
        input: self.name.clone(),
        path: path.to_string(),
        allowed: self.extensions.join(", "),
      })
    }
  }

  fn wrong_kind(&self) -> ValidationError {
    ValidationError::WrongKind {
      input: self.name.clone(),
      expected: self.kind,
    }
  }
}

/// Resolve the concrete input values for a run.
///
/// Supplied values are validated against their specs. Defaults are applied
/// only where no explicit value exists. A required spec with neither a value
/// nor a default fails with [`ValidationError::MissingRequiredInput`] before
/// any task executes.
pub fn resolve_workflow_inputs(
  specs: &[InputSpec],
  supplied: &HashMap<String, serde_json::Value>,
) -> Result<HashMap<String, serde_json::Value>, ValidationError> {
  for name in supplied.keys() {
    if !specs.iter().any(|spec| spec.name == *name) {
      return Err(ValidationError::UnknownInput {
        input: name.clone(),
      });
    }
  }

  let mut resolved = HashMap::new();
  for spec in specs {
    match supplied.get(&spec.name) {
      Some(value) => {
        spec.validate(value)?;
        resolved.insert(spec.name.clone(), value.clone());
      }
      None => match &spec.default {
        Some(default) => {
          resolved.insert(spec.name.clone(), default.clone());
        }
        None if spec.optional => {}
        None => {
          return Err(ValidationError::MissingRequiredInput {
            input: spec.name.clone(),
          });
        }
      },
    }
  }

  Ok(resolved)
}
