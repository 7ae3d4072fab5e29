//! Trellis Graph
//!
//! This crate provides the built workflow representation for Trellis. A
//! `WorkflowGraph` is the validated form of a workflow declaration: template
//! references are pinned against the registry, bindings are checked, and the
//! dependency structure is consistent.
//!
//! Key differences from `trellis-config`:
//! - Templates are locked to a concrete version with their schema captured
//! - Every binding target is known to exist
//! - Pure topology plus schema: no execution state is stored here, so one
//!   graph is safely shared by many concurrent runs
//!
//! The [`plan`] module turns a graph into a deterministic [`ExecutionPlan`].

mod error;
mod graph;
mod node;
pub mod plan;
mod workflow;

pub use error::PlanError;
pub use graph::Graph;
pub use node::{LockedTemplate, TaskKind, TaskNode};
pub use plan::{ExecutionPlan, resolve};
pub use workflow::WorkflowGraph;
