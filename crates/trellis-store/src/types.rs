use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// Status of a run as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RunStatus {
  Running,
  Succeeded,
  Failed,
}

/// State of a single task within a run.
///
/// `Pending -> Ready -> Running -> Completed | Failed`; dependents of a
/// failed task become `Skipped` and are never attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum NodeState {
  Pending,
  Ready,
  Running,
  Completed,
  Failed,
  Skipped,
}

/// A run as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RunRecord {
  pub run_id: String,
  pub workflow_id: String,
  /// The concrete top-level input values this run was started with.
  pub inputs: Json<serde_json::Value>,
  pub status: RunStatus,
  pub started_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
}

/// A task's execution state as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TaskRecord {
  pub run_id: String,
  pub task_id: String,
  pub state: NodeState,
  pub started_at: Option<DateTime<Utc>>,
  pub completed_at: Option<DateTime<Utc>>,
  /// Exposed output name -> produced artifact, as JSON.
  pub outputs: Option<Json<serde_json::Value>>,
  pub error: Option<String>,
}
