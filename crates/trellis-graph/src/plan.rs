//! Plan resolution: topological ordering of a built graph.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use trellis_config::{BindingDef, OutputSource};

use crate::error::PlanError;
use crate::workflow::WorkflowGraph;

/// A deterministic topological ordering of a graph's tasks.
///
/// Two resolutions of the same graph always produce the same order: ties
/// between simultaneously runnable tasks are broken by declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
  pub workflow_id: String,
  pub order: Vec<String>,
}

/// Resolve a built graph into an execution plan.
///
/// # Errors
/// - [`PlanError::DanglingReference`] if a `needs` entry, parameter binding,
///   or workflow output references something not in the graph.
/// - [`PlanError::Cycle`] if the dependency graph is not acyclic, including
///   a task that needs itself.
pub fn resolve(graph: &WorkflowGraph) -> Result<ExecutionPlan, PlanError> {
  check_references(graph)?;

  let index: HashMap<&str, usize> = graph
    .tasks
    .iter()
    .enumerate()
    .map(|(i, task)| (task.task_id.as_str(), i))
    .collect();

  // Kahn's algorithm over declaration indices. `needs` may repeat an id;
  // count each dependency once.
  let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); graph.tasks.len()];
  let mut in_degree: Vec<usize> = vec![0; graph.tasks.len()];

  for (i, task) in graph.tasks.iter().enumerate() {
    let unique_needs: HashSet<&str> = task.needs.iter().map(|need| need.as_str()).collect();
    in_degree[i] = unique_needs.len();
    for need in unique_needs {
      adjacency[index[need]].push(i);
    }
  }

  let mut ready: BTreeSet<usize> = in_degree
    .iter()
    .enumerate()
    .filter(|&(_, &degree)| degree == 0)
    .map(|(i, _)| i)
    .collect();

  let mut order = Vec::with_capacity(graph.tasks.len());
  while let Some(&next) = ready.first() {
    ready.remove(&next);
    order.push(graph.tasks[next].task_id.clone());

    for &dependent in &adjacency[next] {
      in_degree[dependent] -= 1;
      if in_degree[dependent] == 0 {
        ready.insert(dependent);
      }
    }
  }

  if order.len() != graph.tasks.len() {
    let emitted: HashSet<&str> = order.iter().map(|id| id.as_str()).collect();
    return Err(PlanError::Cycle {
      task_id: smallest_cycle_member(graph, &emitted),
    });
  }

  Ok(ExecutionPlan {
    workflow_id: graph.workflow_id.clone(),
    order,
  })
}

/// Defensive re-check that every reference in the graph resolves. The
/// builder rejects these earlier; a hand-assembled graph might not have been
/// through it.
fn check_references(graph: &WorkflowGraph) -> Result<(), PlanError> {
  for task in &graph.tasks {
    for need in &task.needs {
      if graph.task(need).is_none() {
        return Err(PlanError::DanglingReference {
          task_id: task.task_id.clone(),
          reference: format!("task '{need}'"),
        });
      }
    }

    for binding in task.params.values() {
      if let BindingDef::TaskOutput { task: source, output } = binding {
        let exposes = graph
          .task(source)
          .is_some_and(|producer| producer.exposes(output));
        if !exposes {
          return Err(PlanError::DanglingReference {
            task_id: task.task_id.clone(),
            reference: format!("output '{output}' of task '{source}'"),
          });
        }
      }
    }
  }

  for spec in &graph.outputs {
    if let OutputSource::Task { task, output } = &spec.source {
      let exposes = graph
        .task(task)
        .is_some_and(|producer| producer.exposes(output));
      if !exposes {
        return Err(PlanError::DanglingReference {
          task_id: task.clone(),
          reference: format!("output '{output}' for workflow output '{}'", spec.name),
        });
      }
    }
  }

  Ok(())
}

/// Find the lexicographically smallest task id that sits on a cycle.
///
/// Tasks left over after Kahn's algorithm are either on a cycle or
/// downstream of one; a DFS over that remainder separates the two.
fn smallest_cycle_member(graph: &WorkflowGraph, emitted: &HashSet<&str>) -> String {
  let remaining: Vec<&str> = graph
    .tasks
    .iter()
    .map(|task| task.task_id.as_str())
    .filter(|id| !emitted.contains(id))
    .collect();
  let remaining_set: HashSet<&str> = remaining.iter().copied().collect();

  let mut downstream: HashMap<&str, Vec<&str>> = HashMap::new();
  for task in &graph.tasks {
    if !remaining_set.contains(task.task_id.as_str()) {
      continue;
    }
    for need in &task.needs {
      if remaining_set.contains(need.as_str()) {
        downstream
          .entry(need.as_str())
          .or_default()
          .push(task.task_id.as_str());
      }
    }
  }

  // DFS with a path stack: a back edge into the stack closes a cycle.
  fn dfs<'a>(
    node: &'a str,
    downstream: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    stack: &mut Vec<&'a str>,
  ) -> Option<Vec<&'a str>> {
    if let Some(position) = stack.iter().position(|&on_stack| on_stack == node) {
      return Some(stack[position..].to_vec());
    }
    if !visited.insert(node) {
      return None;
    }

    stack.push(node);
    if let Some(next) = downstream.get(node) {
      for &neighbor in next {
        if let Some(cycle) = dfs(neighbor, downstream, visited, stack) {
          return Some(cycle);
        }
      }
    }
    stack.pop();
    None
  }

  let mut visited = HashSet::new();
  for &start in &remaining {
    let mut stack = Vec::new();
    if let Some(cycle) = dfs(start, &downstream, &mut visited, &mut stack) {
      return cycle.into_iter().min().unwrap_or(start).to_string();
    }
  }

  // Unreachable for a graph that failed Kahn's algorithm.
  remaining
    .into_iter()
    .min()
    .unwrap_or_default()
    .to_string()
}
