use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Error, RunRecord, RunStatus, RunStore, TaskRecord};

/// In-memory run store for tests and short-lived embedders.
#[derive(Default)]
pub struct MemoryStore {
  runs: Mutex<HashMap<String, RunRecord>>,
  tasks: Mutex<HashMap<String, Vec<TaskRecord>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl RunStore for MemoryStore {
  async fn create_run(&self, run: &RunRecord) -> Result<(), Error> {
    self
      .runs
      .lock()
      .unwrap()
      .insert(run.run_id.clone(), run.clone());
    Ok(())
  }

  async fn get_run(&self, run_id: &str) -> Result<RunRecord, Error> {
    self
      .runs
      .lock()
      .unwrap()
      .get(run_id)
      .cloned()
      .ok_or_else(|| Error::NotFound(format!("run '{run_id}'")))
  }

  async fn update_run_status(
    &self,
    run_id: &str,
    status: RunStatus,
    completed_at: Option<DateTime<Utc>>,
  ) -> Result<(), Error> {
    let mut runs = self.runs.lock().unwrap();
    let run = runs
      .get_mut(run_id)
      .ok_or_else(|| Error::NotFound(format!("run '{run_id}'")))?;
    run.status = status;
    run.completed_at = completed_at;
    Ok(())
  }

  async fn list_runs(&self, workflow_id: &str) -> Result<Vec<RunRecord>, Error> {
    let mut runs: Vec<RunRecord> = self
      .runs
      .lock()
      .unwrap()
      .values()
      .filter(|run| run.workflow_id == workflow_id)
      .cloned()
      .collect();
    runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    Ok(runs)
  }

  async fn upsert_task(&self, task: &TaskRecord) -> Result<(), Error> {
    let mut tasks = self.tasks.lock().unwrap();
    let records = tasks.entry(task.run_id.clone()).or_default();

    match records.iter_mut().find(|r| r.task_id == task.task_id) {
      Some(existing) => *existing = task.clone(),
      None => records.push(task.clone()),
    }
    Ok(())
  }

  async fn list_tasks(&self, run_id: &str) -> Result<Vec<TaskRecord>, Error> {
    Ok(
      self
        .tasks
        .lock()
        .unwrap()
        .get(run_id)
        .cloned()
        .unwrap_or_default(),
    )
  }
}
