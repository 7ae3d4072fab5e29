//! Trellis Config
//!
//! This crate contains the serializable workflow declaration types for
//! Trellis. A declaration is what an author writes: typed inputs and outputs
//! for the workflow boundary, plus the tasks that make up the DAG with their
//! parameter bindings and dependency lists.
//!
//! Declarations can be loaded from:
//! - JSON files (via CLI with `trellis validate workflow.json`)
//! - Database storage (as JSON blobs)
//!
//! The builder takes these declaration types, validates them against template
//! schemas, and produces a `WorkflowGraph` ready for planning and execution.

mod artifact;
mod error;
mod output;
mod spec;
mod task;
mod workflow;

pub use artifact::Artifact;
pub use error::ValidationError;
pub use output::{OutputSource, OutputSpec};
pub use spec::{InputSpec, ValueKind, resolve_workflow_inputs};
pub use task::{BindingDef, OutputRename, TaskDef, TaskImpl};
pub use workflow::WorkflowDef;
