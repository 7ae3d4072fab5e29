use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::RegistryError;
use crate::schema::TemplateSchema;

/// Catalog of template schemas, consulted (not owned) by the builder.
#[async_trait]
pub trait TemplateRegistry: Send + Sync {
  /// Get a template schema by name, optionally pinned to a version.
  ///
  /// With no version, the latest available version is returned.
  async fn get(
    &self,
    name: &str,
    version: Option<&str>,
  ) -> Result<Option<TemplateSchema>, RegistryError>;

  /// List every schema in the catalog.
  async fn list(&self) -> Result<Vec<TemplateSchema>, RegistryError>;
}

/// In-memory registry for tests and embedders.
#[derive(Default)]
pub struct MemoryTemplateRegistry {
  templates: RwLock<HashMap<String, TemplateSchema>>,
}

impl MemoryTemplateRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a schema, replacing any existing one with the same
  /// name/version pair.
  pub fn insert(&self, schema: TemplateSchema) {
    let key = format!("{}@{}", schema.name, schema.version);
    self.templates.write().unwrap().insert(key, schema);
  }
}

#[async_trait]
impl TemplateRegistry for MemoryTemplateRegistry {
  async fn get(
    &self,
    name: &str,
    version: Option<&str>,
  ) -> Result<Option<TemplateSchema>, RegistryError> {
    let templates = self.templates.read().unwrap();

    if let Some(v) = version {
      let key = format!("{}@{}", name, v);
      return Ok(templates.get(&key).cloned());
    }

    // No version requested: take the latest (simple string sort).
    let mut matching: Vec<&TemplateSchema> = templates
      .values()
      .filter(|schema| schema.name == name)
      .collect();
    matching.sort_by(|a, b| b.version.cmp(&a.version));

    Ok(matching.first().map(|schema| (*schema).clone()))
  }

  async fn list(&self) -> Result<Vec<TemplateSchema>, RegistryError> {
    let templates = self.templates.read().unwrap();
    Ok(templates.values().cloned().collect())
  }
}
