use std::collections::HashMap;

use crate::node::TaskNode;

/// Adjacency structure for traversal and analysis.
///
/// Edges are derived from each task's `needs` list: an edge `u -> v` means
/// `v` depends on `u`.
#[derive(Debug, Clone)]
pub struct Graph {
  /// task_id -> list of downstream task_ids.
  adjacency: HashMap<String, Vec<String>>,
  /// task_id -> list of upstream task_ids.
  reverse_adjacency: HashMap<String, Vec<String>>,
  /// Tasks with no dependencies, in declaration order.
  entry_points: Vec<String>,
}

impl Graph {
  /// Build the adjacency structure from declaration-ordered tasks.
  pub fn new(tasks: &[TaskNode]) -> Self {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();

    for task in tasks {
      adjacency.entry(task.task_id.clone()).or_default();
      reverse_adjacency.entry(task.task_id.clone()).or_default();
    }

    for task in tasks {
      for need in &task.needs {
        adjacency
          .entry(need.clone())
          .or_default()
          .push(task.task_id.clone());
        reverse_adjacency
          .entry(task.task_id.clone())
          .or_default()
          .push(need.clone());
      }
    }

    let entry_points: Vec<String> = tasks
      .iter()
      .filter(|task| task.needs.is_empty())
      .map(|task| task.task_id.clone())
      .collect();

    Self {
      adjacency,
      reverse_adjacency,
      entry_points,
    }
  }

  /// Tasks with no dependencies.
  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Tasks that depend on the given task.
  pub fn downstream(&self, task_id: &str) -> &[String] {
    self
      .adjacency
      .get(task_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Tasks the given task depends on.
  pub fn upstream(&self, task_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(task_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }
}
