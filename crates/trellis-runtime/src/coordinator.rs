//! Execution coordination.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use trellis_config::{Artifact, resolve_workflow_inputs};
use trellis_graph::{ExecutionPlan, Graph, PlanError, WorkflowGraph, plan};
use trellis_store::{Json, NodeState, RunRecord, RunStatus, RunStore, TaskRecord};

use crate::error::{RunError, TaskError};
use crate::executor::{OperationRuntime, TemplateExecutor};
use crate::task::{TaskResult, bind_params, execute_task};

/// Configuration for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
  /// Maximum number of tasks dispatched concurrently.
  pub concurrency: usize,
}

impl Default for CoordinatorConfig {
  fn default() -> Self {
    Self { concurrency: 4 }
  }
}

/// Final state of a run.
#[derive(Debug)]
pub struct RunOutcome {
  pub run_id: String,
  pub status: RunStatus,
  /// Results of every completed task, keyed by task id.
  pub results: HashMap<String, TaskResult>,
  /// Final state of every task, keyed by task id.
  pub states: HashMap<String, NodeState>,
}

/// The execution coordinator.
///
/// Owns a built graph and its resolved plan, and walks the plan against the
/// external executors: tasks whose dependencies have all completed are
/// dispatched concurrently, bounded by the configured limit. Every state
/// transition is written to the run store, which is what makes a partially
/// failed run resumable.
pub struct Coordinator {
  graph: Arc<WorkflowGraph>,
  plan: ExecutionPlan,
  templates: Arc<dyn TemplateExecutor>,
  operations: Arc<dyn OperationRuntime>,
  store: Arc<dyn RunStore>,
  config: CoordinatorConfig,
}

impl Coordinator {
  /// Create a coordinator for a built graph.
  ///
  /// The plan is resolved here, so a structurally invalid graph is rejected
  /// before any run can start.
  pub fn new(
    graph: Arc<WorkflowGraph>,
    templates: Arc<dyn TemplateExecutor>,
    operations: Arc<dyn OperationRuntime>,
    store: Arc<dyn RunStore>,
    config: CoordinatorConfig,
  ) -> Result<Self, PlanError> {
    let plan = plan::resolve(&graph)?;

    Ok(Self {
      graph,
      plan,
      templates,
      operations,
      store,
      config,
    })
  }

  /// The plan this coordinator executes.
  pub fn plan(&self) -> &ExecutionPlan {
    &self.plan
  }

  /// Start a new run with the given input values.
  ///
  /// Inputs are validated and defaults applied before any task dispatches;
  /// a missing required input fails here.
  #[instrument(
    name = "workflow_execute",
    skip(self, supplied, cancel),
    fields(workflow_id = %self.graph.workflow_id)
  )]
  pub async fn execute(
    &self,
    supplied: HashMap<String, serde_json::Value>,
    cancel: CancellationToken,
  ) -> Result<RunOutcome, RunError> {
    let inputs = resolve_workflow_inputs(&self.graph.inputs, &supplied)?;
    let run_id = uuid::Uuid::new_v4().to_string();

    self
      .store
      .create_run(&RunRecord {
        run_id: run_id.clone(),
        workflow_id: self.graph.workflow_id.clone(),
        inputs: Json(serde_json::Value::Object(
          inputs.clone().into_iter().collect(),
        )),
        status: RunStatus::Running,
        started_at: Utc::now(),
        completed_at: None,
      })
      .await?;

    let mut states = HashMap::new();
    for task in &self.graph.tasks {
      states.insert(task.task_id.clone(), NodeState::Pending);
      self
        .store
        .upsert_task(&self.task_record(&run_id, &task.task_id, NodeState::Pending))
        .await?;
    }

    info!(run_id = %run_id, "run_started");

    self
      .run_loop(run_id, inputs, HashMap::new(), states, cancel)
      .await
  }

  /// Resume a persisted run.
  ///
  /// Completed tasks keep their recorded artifacts and are not re-executed;
  /// everything else (`Pending`, `Running`, `Failed`, `Skipped`) is
  /// attempted again.
  #[instrument(
    name = "workflow_resume",
    skip(self, cancel),
    fields(workflow_id = %self.graph.workflow_id)
  )]
  pub async fn resume(
    &self,
    run_id: &str,
    cancel: CancellationToken,
  ) -> Result<RunOutcome, RunError> {
    let run = self.store.get_run(run_id).await?;

    if run.workflow_id != self.graph.workflow_id {
      return Err(RunError::WorkflowMismatch {
        run_id: run_id.to_string(),
        expected: self.graph.workflow_id.clone(),
        actual: run.workflow_id,
      });
    }

    let supplied: HashMap<String, serde_json::Value> = match run.inputs.0 {
      serde_json::Value::Object(map) => map.into_iter().collect(),
      _ => {
        return Err(RunError::CorruptRun {
          run_id: run_id.to_string(),
        });
      }
    };
    let inputs = resolve_workflow_inputs(&self.graph.inputs, &supplied)?;

    let mut states: HashMap<String, NodeState> = self
      .graph
      .tasks
      .iter()
      .map(|task| (task.task_id.clone(), NodeState::Pending))
      .collect();
    let mut completed = HashMap::new();

    for record in self.store.list_tasks(run_id).await? {
      if record.state == NodeState::Completed {
        let outputs: HashMap<String, Artifact> = record
          .outputs
          .as_ref()
          .and_then(|json| serde_json::from_value(json.0.clone()).ok())
          .unwrap_or_default();

        completed.insert(
          record.task_id.clone(),
          TaskResult {
            task_id: record.task_id.clone(),
            resolved_inputs: HashMap::new(),
            outputs,
          },
        );
        states.insert(record.task_id.clone(), NodeState::Completed);
      } else {
        self
          .store
          .upsert_task(&self.task_record(run_id, &record.task_id, NodeState::Pending))
          .await?;
      }
    }

    self
      .store
      .update_run_status(run_id, RunStatus::Running, None)
      .await?;

    info!(run_id = %run_id, resumed_completed = completed.len(), "run_resumed");

    self
      .run_loop(run_id.to_string(), inputs, completed, states, cancel)
      .await
  }

  /// The main dispatch loop: find ready tasks, run the batch, publish
  /// results, repeat until nothing is runnable.
  async fn run_loop(
    &self,
    run_id: String,
    inputs: HashMap<String, serde_json::Value>,
    mut completed: HashMap<String, TaskResult>,
    mut states: HashMap<String, NodeState>,
    cancel: CancellationToken,
  ) -> Result<RunOutcome, RunError> {
    let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
    let topology = self.graph.graph();

    loop {
      if cancel.is_cancelled() {
        warn!(run_id = %run_id, "run cancelled");
        self
          .store
          .update_run_status(&run_id, RunStatus::Failed, Some(Utc::now()))
          .await?;
        return Err(RunError::Cancelled);
      }

      self.propagate_skips(&run_id, &topology, &mut states).await?;

      let ready = self.find_ready(&topology, &states);
      if ready.is_empty() {
        break;
      }

      info!(run_id = %run_id, ready = ?ready, "dispatching ready tasks");

      let mut handles = Vec::with_capacity(ready.len());
      for task_id in ready {
        states.insert(task_id.clone(), NodeState::Ready);

        let node = match self.graph.task(&task_id) {
          Some(node) => node.clone(),
          None => continue,
        };

        // Bind against predecessors now; a binding failure fails the task
        // without ever dispatching it.
        let bound = match bind_params(&node, &inputs, &completed) {
          Ok(bound) => bound,
          Err(err) => {
            self.mark_failed(&run_id, &task_id, &mut states, &err).await?;
            continue;
          }
        };

        let started_at = Utc::now();
        states.insert(task_id.clone(), NodeState::Running);
        self
          .store
          .upsert_task(&TaskRecord {
            run_id: run_id.clone(),
            task_id: task_id.clone(),
            state: NodeState::Running,
            started_at: Some(started_at),
            completed_at: None,
            outputs: None,
            error: None,
          })
          .await?;

        let templates = self.templates.clone();
        let operations = self.operations.clone();
        let semaphore = semaphore.clone();
        handles.push(tokio::spawn(async move {
          // The semaphore outlives the run loop and is never closed.
          let _permit = semaphore.acquire_owned().await.ok();
          let result = execute_task(&node, bound, templates.as_ref(), operations.as_ref()).await;
          (node.task_id.clone(), started_at, result)
        }));
      }

      if handles.is_empty() {
        // Every ready task failed at binding; loop to propagate skips.
        continue;
      }

      let joined = tokio::select! {
        joined = futures::future::join_all(handles) => joined,
        _ = cancel.cancelled() => {
          warn!(run_id = %run_id, "run cancelled during task execution");
          self
            .store
            .update_run_status(&run_id, RunStatus::Failed, Some(Utc::now()))
            .await?;
          return Err(RunError::Cancelled);
        }
      };

      // Single publication point: readiness is only re-evaluated after the
      // whole batch has reported.
      for join_result in joined {
        let (task_id, started_at, result) = join_result.map_err(|e| RunError::Join {
          message: e.to_string(),
        })?;

        match result {
          Ok(task_result) => {
            info!(run_id = %run_id, task_id = %task_id, "task_completed");
            states.insert(task_id.clone(), NodeState::Completed);
            self
              .store
              .upsert_task(&TaskRecord {
                run_id: run_id.clone(),
                task_id: task_id.clone(),
                state: NodeState::Completed,
                started_at: Some(started_at),
                completed_at: Some(Utc::now()),
                outputs: Some(Json(
                  serde_json::to_value(&task_result.outputs)
                    .unwrap_or(serde_json::Value::Null),
                )),
                error: None,
              })
              .await?;
            completed.insert(task_id, task_result);
          }
          Err(err) => {
            error!(run_id = %run_id, task_id = %task_id, error = %err, "task_failed");
            states.insert(task_id.clone(), NodeState::Failed);
            self
              .store
              .upsert_task(&TaskRecord {
                run_id: run_id.clone(),
                task_id: task_id.clone(),
                state: NodeState::Failed,
                started_at: Some(started_at),
                completed_at: Some(Utc::now()),
                outputs: None,
                error: Some(err.to_string()),
              })
              .await?;
          }
        }
      }
    }

    let status = if states.values().all(|state| *state == NodeState::Completed) {
      RunStatus::Succeeded
    } else {
      RunStatus::Failed
    };
    self
      .store
      .update_run_status(&run_id, status, Some(Utc::now()))
      .await?;

    match status {
      RunStatus::Succeeded => info!(run_id = %run_id, "run_completed"),
      _ => error!(run_id = %run_id, "run_failed"),
    }

    Ok(RunOutcome {
      run_id,
      status,
      results: completed,
      states,
    })
  }

  /// Mark every pending task downstream of a failed or skipped task as
  /// `Skipped`, transitively. Skipped tasks are never dispatched.
  async fn propagate_skips(
    &self,
    run_id: &str,
    topology: &Graph,
    states: &mut HashMap<String, NodeState>,
  ) -> Result<(), RunError> {
    let mut queue: VecDeque<String> = states
      .iter()
      .filter(|(_, state)| matches!(state, NodeState::Failed | NodeState::Skipped))
      .map(|(task_id, _)| task_id.clone())
      .collect();

    while let Some(task_id) = queue.pop_front() {
      for dependent in topology.downstream(&task_id) {
        if matches!(states.get(dependent), Some(NodeState::Pending)) {
          warn!(run_id = %run_id, task_id = %dependent, "task_skipped");
          states.insert(dependent.clone(), NodeState::Skipped);
          self
            .store
            .upsert_task(&self.task_record(run_id, dependent, NodeState::Skipped))
            .await?;
          queue.push_back(dependent.clone());
        }
      }
    }

    Ok(())
  }

  /// Pending tasks whose dependencies have all completed, in plan order.
  fn find_ready(&self, topology: &Graph, states: &HashMap<String, NodeState>) -> Vec<String> {
    self
      .plan
      .order
      .iter()
      .filter(|task_id| matches!(states.get(*task_id), Some(NodeState::Pending)))
      .filter(|task_id| {
        topology
          .upstream(task_id)
          .iter()
          .all(|up| matches!(states.get(up), Some(NodeState::Completed)))
      })
      .cloned()
      .collect()
  }

  async fn mark_failed(
    &self,
    run_id: &str,
    task_id: &str,
    states: &mut HashMap<String, NodeState>,
    err: &TaskError,
  ) -> Result<(), RunError> {
    error!(run_id = %run_id, task_id = %task_id, error = %err, "task_failed");
    states.insert(task_id.to_string(), NodeState::Failed);

    let now = Utc::now();
    self
      .store
      .upsert_task(&TaskRecord {
        run_id: run_id.to_string(),
        task_id: task_id.to_string(),
        state: NodeState::Failed,
        started_at: Some(now),
        completed_at: Some(now),
        outputs: None,
        error: Some(err.to_string()),
      })
      .await?;
    Ok(())
  }

  fn task_record(&self, run_id: &str, task_id: &str, state: NodeState) -> TaskRecord {
    TaskRecord {
      run_id: run_id.to_string(),
      task_id: task_id.to_string(),
      state,
      started_at: None,
      completed_at: None,
      outputs: None,
      error: None,
    }
  }
}
