use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::RegistryError;
use crate::registry::TemplateRegistry;
use crate::schema::TemplateSchema;

/// Filesystem-based template registry.
///
/// Schema manifests are stored one file per template version:
/// ```text
/// {root}/
/// ├── daylight-coefficient--1.0.0.json
/// └── daylight-coefficient--1.1.0.json
/// ```
pub struct FsTemplateRegistry {
  root: PathBuf,
}

impl FsTemplateRegistry {
  /// Create a new filesystem registry at the given root path.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Get the root directory of the registry.
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Parse a manifest file name into (name, version).
  /// Example: "daylight-coefficient--1.0.0.json" -> ("daylight-coefficient", "1.0.0")
  fn parse_file_name(file_name: &str) -> Option<(String, String)> {
    let stem = file_name.strip_suffix(".json")?;
    let last_sep = stem.rfind("--")?;
    Some((
      stem[..last_sep].to_string(),
      stem[last_sep + 2..].to_string(),
    ))
  }

  async fn read_schema(&self, path: &Path) -> Result<TemplateSchema, RegistryError> {
    let content = fs::read_to_string(path).await?;
    let schema: TemplateSchema = serde_json::from_str(&content)?;
    Ok(schema)
  }
}

#[async_trait]
impl TemplateRegistry for FsTemplateRegistry {
  async fn get(
    &self,
    name: &str,
    version: Option<&str>,
  ) -> Result<Option<TemplateSchema>, RegistryError> {
    if !self.root.exists() {
      return Ok(None);
    }

    let mut entries = fs::read_dir(&self.root).await?;
    let mut matching: Vec<TemplateSchema> = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
      let path = entry.path();
      let file_name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => continue,
      };

      if let Some((parsed_name, parsed_version)) = Self::parse_file_name(file_name)
        && parsed_name == name
      {
        if let Some(v) = version {
          if parsed_version == v {
            return Ok(Some(self.read_schema(&path).await?));
          }
        } else {
          matching.push(self.read_schema(&path).await?);
        }
      }
    }

    if version.is_none() && !matching.is_empty() {
      // Return the latest version (simple string sort for now).
      matching.sort_by(|a, b| b.version.cmp(&a.version));
      return Ok(matching.into_iter().next());
    }

    Ok(None)
  }

  async fn list(&self) -> Result<Vec<TemplateSchema>, RegistryError> {
    let mut schemas = Vec::new();

    if !self.root.exists() {
      return Ok(schemas);
    }

    let mut entries = fs::read_dir(&self.root).await?;
    while let Some(entry) = entries.next_entry().await? {
      let path = entry.path();
      if path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(Self::parse_file_name)
        .is_some()
      {
        schemas.push(self.read_schema(&path).await?);
      }
    }

    Ok(schemas)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_file_name() {
    let result = FsTemplateRegistry::parse_file_name("daylight-coefficient--1.0.0.json");
    assert_eq!(
      result,
      Some(("daylight-coefficient".to_string(), "1.0.0".to_string()))
    );
  }

  #[test]
  fn test_parse_file_name_without_version() {
    assert_eq!(FsTemplateRegistry::parse_file_name("notes.json"), None);
  }

  #[test]
  fn test_parse_file_name_wrong_extension() {
    assert_eq!(
      FsTemplateRegistry::parse_file_name("daylight--1.0.0.yaml"),
      None
    );
  }

  #[tokio::test]
  async fn get_reads_manifest_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = r#"{
      "name": "daylight-coefficient",
      "version": "1.0.0",
      "inputs": [],
      "outputs": [{ "name": "results", "kind": "folder" }]
    }"#;
    std::fs::write(
      dir.path().join("daylight-coefficient--1.0.0.json"),
      manifest,
    )
    .unwrap();

    let registry = FsTemplateRegistry::new(dir.path());
    let schema = registry
      .get("daylight-coefficient", Some("1.0.0"))
      .await
      .unwrap()
      .unwrap();

    assert_eq!(schema.outputs[0].name, "results");
  }

  #[tokio::test]
  async fn get_on_missing_root_returns_none() {
    let registry = FsTemplateRegistry::new("/nonexistent/templates");
    let schema = registry.get("anything", None).await.unwrap();
    assert!(schema.is_none());
  }
}
