use thiserror::Error;

/// Errors raised by template registry implementations.
#[derive(Debug, Error)]
pub enum RegistryError {
  /// Filesystem error while reading the catalog.
  #[error("registry io error: {0}")]
  Io(#[from] std::io::Error),

  /// A schema manifest could not be parsed.
  #[error("invalid template manifest: {0}")]
  InvalidManifest(#[from] serde_json::Error),
}
