use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{Error, NodeState, RunRecord, RunStatus, RunStore, TaskRecord};

/// SQLite-based run store implementation.
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(&self.pool).await
  }
}

#[async_trait]
impl RunStore for SqliteStore {
  async fn create_run(&self, run: &RunRecord) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO workflow_runs (run_id, workflow_id, inputs, status, started_at, completed_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
    )
    .bind(&run.run_id)
    .bind(&run.workflow_id)
    .bind(&run.inputs)
    .bind(run.status)
    .bind(run.started_at)
    .bind(run.completed_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn get_run(&self, run_id: &str) -> Result<RunRecord, Error> {
    let run = sqlx::query_as(
      r#"
            SELECT run_id, workflow_id, inputs, status, started_at, completed_at
            FROM workflow_runs
            WHERE run_id = ?
            "#,
    )
    .bind(run_id)
    .fetch_one(&self.pool)
    .await?;

    Ok(run)
  }

  async fn update_run_status(
    &self,
    run_id: &str,
    status: RunStatus,
    completed_at: Option<DateTime<Utc>>,
  ) -> Result<(), Error> {
    sqlx::query(
      r#"
            UPDATE workflow_runs
            SET status = ?, completed_at = ?
            WHERE run_id = ?
            "#,
    )
    .bind(status)
    .bind(completed_at)
    .bind(run_id)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn list_runs(&self, workflow_id: &str) -> Result<Vec<RunRecord>, Error> {
    let runs = sqlx::query_as(
      r#"
            SELECT run_id, workflow_id, inputs, status, started_at, completed_at
            FROM workflow_runs
            WHERE workflow_id = ?
            ORDER BY started_at DESC
            "#,
    )
    .bind(workflow_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(runs)
  }

  async fn upsert_task(&self, task: &TaskRecord) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO run_tasks (run_id, task_id, state, started_at, completed_at, outputs, error)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (run_id, task_id) DO UPDATE
            SET state = excluded.state,
                started_at = excluded.started_at,
                completed_at = excluded.completed_at,
                outputs = excluded.outputs,
                error = excluded.error
            "#,
    )
    .bind(&task.run_id)
    .bind(&task.task_id)
    .bind(task.state)
    .bind(task.started_at)
    .bind(task.completed_at)
    .bind(&task.outputs)
    .bind(&task.error)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn list_tasks(&self, run_id: &str) -> Result<Vec<TaskRecord>, Error> {
    let tasks = sqlx::query_as(
      r#"
            SELECT run_id, task_id, state, started_at, completed_at, outputs, error
            FROM run_tasks
            WHERE run_id = ?
            ORDER BY task_id ASC
            "#,
    )
    .bind(run_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(tasks)
  }
}
