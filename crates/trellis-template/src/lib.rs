//! Trellis Template
//!
//! Templates are reusable sub-workflows owned by an external catalog. The
//! engine never looks at how a template does its work; it only needs the
//! template's fixed input/output schema to bind parameters and validate
//! output references at build time.
//!
//! This crate provides the [`TemplateRegistry`] trait the builder consults,
//! a filesystem implementation that reads schema manifests from a directory,
//! and an in-memory implementation for tests and embedders.

mod error;
mod fs_registry;
mod registry;
mod schema;

pub use error::RegistryError;
pub use fs_registry::FsTemplateRegistry;
pub use registry::{MemoryTemplateRegistry, TemplateRegistry};
pub use schema::{TemplateOutput, TemplateSchema};
