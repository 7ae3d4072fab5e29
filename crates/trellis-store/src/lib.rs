//! Trellis Store
//!
//! This crate provides the storage trait and implementations for run
//! records: the per-run, per-task execution state the coordinator persists
//! so a partially failed run can be resumed instead of re-executed.
//!
//! The [`RunStore`] trait defines operations for:
//! - Creating and updating runs (keyed by run id, recording the workflow id
//!   and the concrete input values used)
//! - Writing per-task state transitions and produced artifacts
//! - Querying run history

mod memory;
mod sqlite;
mod types;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use sqlx::types::Json;
pub use types::{NodeState, RunRecord, RunStatus, TaskRecord};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),
}

/// Storage trait for run records.
#[async_trait]
pub trait RunStore: Send + Sync {
  /// Create a new run.
  async fn create_run(&self, run: &RunRecord) -> Result<(), Error>;

  /// Get a run by id.
  async fn get_run(&self, run_id: &str) -> Result<RunRecord, Error>;

  /// Update the status of a run.
  async fn update_run_status(
    &self,
    run_id: &str,
    status: RunStatus,
    completed_at: Option<DateTime<Utc>>,
  ) -> Result<(), Error>;

  /// List runs for a workflow, newest first.
  async fn list_runs(&self, workflow_id: &str) -> Result<Vec<RunRecord>, Error>;

  /// Insert or update a task record.
  async fn upsert_task(&self, task: &TaskRecord) -> Result<(), Error>;

  /// List task records for a run.
  async fn list_tasks(&self, run_id: &str) -> Result<Vec<TaskRecord>, Error>;
}
