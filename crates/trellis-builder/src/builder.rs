use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use trellis_config::{BindingDef, OutputSource, TaskDef, TaskImpl, WorkflowDef};
use trellis_graph::{LockedTemplate, TaskKind, TaskNode, WorkflowGraph};
use trellis_template::TemplateRegistry;

use crate::error::BuildError;

/// Builder transforms a `WorkflowDef` into a validated `WorkflowGraph`.
#[async_trait]
pub trait GraphBuilder: Send + Sync {
  /// Build a workflow declaration into a validated graph.
  ///
  /// This process:
  /// 1. Checks identifier uniqueness across tasks and top-level specs
  /// 2. Locks template references against the registry
  /// 3. Resolves every parameter binding and output rename
  /// 4. Checks dependency consistency between bindings and `needs`
  async fn build(&self, def: WorkflowDef) -> Result<WorkflowGraph, BuildError>;
}

/// Standard builder implementation that uses a template registry.
pub struct StandardBuilder<R: TemplateRegistry> {
  registry: R,
}

impl<R: TemplateRegistry> StandardBuilder<R> {
  /// Create a new builder with the given template registry.
  pub fn new(registry: R) -> Self {
    Self { registry }
  }

  /// Check that no task or top-level spec name repeats.
  fn check_duplicates(&self, def: &WorkflowDef) -> Result<(), BuildError> {
    let mut task_ids = HashSet::new();
    for task in &def.tasks {
      if !task_ids.insert(task.task_id.as_str()) {
        return Err(BuildError::DuplicateIdentifier {
          name: task.task_id.clone(),
        });
      }
    }

    let mut input_names = HashSet::new();
    for spec in &def.inputs {
      if !input_names.insert(spec.name.as_str()) {
        return Err(BuildError::DuplicateIdentifier {
          name: spec.name.clone(),
        });
      }
    }

    let mut output_names = HashSet::new();
    for spec in &def.outputs {
      if !output_names.insert(spec.name.as_str()) {
        return Err(BuildError::DuplicateIdentifier {
          name: spec.name.clone(),
        });
      }
    }

    Ok(())
  }

  /// Look up a template in the registry and pin it.
  async fn lock_template(
    &self,
    name: &str,
    version: Option<&str>,
  ) -> Result<LockedTemplate, BuildError> {
    match self.registry.get(name, version).await? {
      Some(schema) => Ok(LockedTemplate {
        name: schema.name.clone(),
        version: schema.version.clone(),
        schema,
      }),
      None => match version {
        Some(v) => Err(BuildError::TemplateVersionNotFound {
          name: name.to_string(),
          version: v.to_string(),
        }),
        None => Err(BuildError::TemplateNotFound {
          name: name.to_string(),
        }),
      },
    }
  }

  /// Lock a single task declaration, validating its output renames.
  async fn lock_task(&self, task: &TaskDef) -> Result<TaskNode, BuildError> {
    let kind = match &task.implementation {
      TaskImpl::Template { name, version } => {
        TaskKind::Template(self.lock_template(name, version.as_deref()).await?)
      }
      TaskImpl::Operation {
        operation,
        produces,
      } => TaskKind::Operation {
        operation: operation.clone(),
        produces: produces.clone(),
      },
    };

    let node = TaskNode {
      task_id: task.task_id.clone(),
      kind,
      params: task.params.clone(),
      needs: task.needs.clone(),
      outputs: task.outputs.clone(),
    };

    let declared: HashSet<&str> = node.declared_outputs().into_iter().collect();
    for rename in &node.outputs {
      if !declared.contains(rename.from.as_str()) {
        return Err(BuildError::UnknownOutput {
          task_id: node.task_id.clone(),
          output: rename.from.clone(),
        });
      }
    }

    let mut exposed = HashSet::new();
    for name in node.exposed_outputs() {
      if !exposed.insert(name.to_string()) {
        return Err(BuildError::DuplicateIdentifier {
          name: name.to_string(),
        });
      }
    }

    Ok(node)
  }

  /// Validate a task's `needs` and parameter bindings against the rest of
  /// the graph. `position` is the task's declaration index; bindings may
  /// only reach tasks declared before it.
  fn check_bindings(
    &self,
    def: &WorkflowDef,
    nodes: &[TaskNode],
    position: usize,
  ) -> Result<(), BuildError> {
    let node = &nodes[position];
    let task_index: HashMap<&str, usize> = nodes
      .iter()
      .enumerate()
      .map(|(i, n)| (n.task_id.as_str(), i))
      .collect();
    let needs: HashSet<&str> = node.needs.iter().map(|need| need.as_str()).collect();

    for need in &node.needs {
      if !task_index.contains_key(need.as_str()) {
        return Err(BuildError::UnknownTask {
          task_id: node.task_id.clone(),
          dependency: need.clone(),
        });
      }
    }

    let schema = match &node.kind {
      TaskKind::Template(locked) => Some(&locked.schema),
      TaskKind::Operation { .. } => None,
    };

    for (parameter, binding) in &node.params {
      if let Some(schema) = schema
        && schema.input(parameter).is_none()
      {
        return Err(BuildError::UnknownParameter {
          task_id: node.task_id.clone(),
          parameter: parameter.clone(),
        });
      }

      match binding {
        BindingDef::Literal { value } => {
          if let Some(spec) = schema.and_then(|s| s.input(parameter)) {
            spec
              .validate(value)
              .map_err(|source| BuildError::InvalidParameter {
                task_id: node.task_id.clone(),
                parameter: parameter.clone(),
                source,
              })?;
          }
        }
        BindingDef::Input { input } => {
          if !def.inputs.iter().any(|spec| spec.name == *input) {
            return Err(BuildError::UnknownInput {
              task_id: node.task_id.clone(),
              input: input.clone(),
            });
          }
        }
        BindingDef::TaskOutput { task, output } => {
          let producer_index = match task_index.get(task.as_str()) {
            Some(&i) => i,
            None => {
              return Err(BuildError::UnknownTask {
                task_id: node.task_id.clone(),
                dependency: task.clone(),
              });
            }
          };

          if producer_index >= position {
            return Err(BuildError::ForwardReference {
              task_id: node.task_id.clone(),
              dependency: task.clone(),
            });
          }
          if !needs.contains(task.as_str()) {
            return Err(BuildError::InconsistentDependency {
              task_id: node.task_id.clone(),
              dependency: task.clone(),
            });
          }
          if !nodes[producer_index].exposes(output) {
            return Err(BuildError::UnknownOutput {
              task_id: task.clone(),
              output: output.clone(),
            });
          }
        }
      }
    }

    // Every required template input must be bound or carry a default.
    if let Some(schema) = schema {
      for spec in &schema.inputs {
        let bound = node.params.contains_key(&spec.name);
        if !bound && spec.default.is_none() && !spec.optional {
          return Err(BuildError::UnboundParameter {
            task_id: node.task_id.clone(),
            parameter: spec.name.clone(),
          });
        }
      }
    }

    Ok(())
  }

  /// Validate that every workflow output source resolves.
  fn check_outputs(&self, def: &WorkflowDef, nodes: &[TaskNode]) -> Result<(), BuildError> {
    for spec in &def.outputs {
      if let OutputSource::Task { task, output } = &spec.source {
        let producer = match nodes.iter().find(|node| node.task_id == *task) {
          Some(node) => node,
          None => {
            return Err(BuildError::UnknownOutputSource {
              output: spec.name.clone(),
              task: task.clone(),
            });
          }
        };
        if !producer.exposes(output) {
          return Err(BuildError::UnknownOutput {
            task_id: task.clone(),
            output: output.clone(),
          });
        }
      }
    }
    Ok(())
  }
}

#[async_trait]
impl<R: TemplateRegistry> GraphBuilder for StandardBuilder<R> {
  async fn build(&self, def: WorkflowDef) -> Result<WorkflowGraph, BuildError> {
    self.check_duplicates(&def)?;

    let mut nodes = Vec::with_capacity(def.tasks.len());
    for task in &def.tasks {
      nodes.push(self.lock_task(task).await?);
    }

    for position in 0..nodes.len() {
      self.check_bindings(&def, &nodes, position)?;
    }

    self.check_outputs(&def, &nodes)?;

    Ok(WorkflowGraph {
      workflow_id: def.workflow_id,
      name: def.name,
      inputs: def.inputs,
      outputs: def.outputs,
      tasks: nodes,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  use trellis_config::{InputSpec, OutputRename, OutputSpec, ValueKind};
  use trellis_template::{MemoryTemplateRegistry, TemplateOutput, TemplateSchema};

  fn registry_with_daylight() -> MemoryTemplateRegistry {
    let registry = MemoryTemplateRegistry::new();
    registry.insert(TemplateSchema {
      name: "daylight".to_string(),
      version: "1.0.0".to_string(),
      description: String::new(),
      inputs: vec![
        InputSpec {
          name: "north".to_string(),
          kind: ValueKind::Number,
          description: String::new(),
          default: Some(json!(0)),
          minimum: Some(0.0),
          maximum: Some(360.0),
          extensions: vec![],
          optional: false,
          alias: None,
        },
        InputSpec {
          name: "model".to_string(),
          kind: ValueKind::File,
          description: String::new(),
          default: None,
          minimum: None,
          maximum: None,
          extensions: vec!["json".to_string()],
          optional: false,
          alias: None,
        },
      ],
      outputs: vec![TemplateOutput {
        name: "results".to_string(),
        kind: ValueKind::Folder,
        description: String::new(),
      }],
    });
    registry
  }

  fn model_input() -> InputSpec {
    InputSpec {
      name: "model".to_string(),
      kind: ValueKind::File,
      description: String::new(),
      default: None,
      minimum: None,
      maximum: None,
      extensions: vec!["json".to_string()],
      optional: false,
      alias: None,
    }
  }

  fn template_task(id: &str) -> TaskDef {
    TaskDef {
      task_id: id.to_string(),
      implementation: TaskImpl::Template {
        name: "daylight".to_string(),
        version: Some("1.0.0".to_string()),
      },
      params: HashMap::from([(
        "model".to_string(),
        BindingDef::Input {
          input: "model".to_string(),
        },
      )]),
      needs: vec![],
      outputs: vec![],
    }
  }

  fn operation_task(id: &str, needs: &[&str], produces: &[&str]) -> TaskDef {
    TaskDef {
      task_id: id.to_string(),
      implementation: TaskImpl::Operation {
        operation: format!("op-{id}"),
        produces: produces.iter().map(|name| name.to_string()).collect(),
      },
      params: HashMap::new(),
      needs: needs.iter().map(|need| need.to_string()).collect(),
      outputs: vec![],
    }
  }

  fn make_def(tasks: Vec<TaskDef>) -> WorkflowDef {
    WorkflowDef {
      workflow_id: "test".to_string(),
      name: "Test".to_string(),
      inputs: vec![model_input()],
      outputs: vec![],
      tasks,
    }
  }

  #[tokio::test]
  async fn build_simple_workflow() {
    let builder = StandardBuilder::new(registry_with_daylight());
    let graph = builder.build(make_def(vec![template_task("sim")])).await.unwrap();

    assert_eq!(graph.tasks.len(), 1);
    match &graph.tasks[0].kind {
      TaskKind::Template(locked) => {
        assert_eq!(locked.name, "daylight");
        assert_eq!(locked.version, "1.0.0");
      }
      _ => panic!("expected template task"),
    }
  }

  #[tokio::test]
  async fn building_twice_yields_identical_graphs() {
    let builder = StandardBuilder::new(registry_with_daylight());
    let def = make_def(vec![
      template_task("sim"),
      operation_task("post", &["sim"], &["report"]),
    ]);

    let first = builder.build(def.clone()).await.unwrap();
    let second = builder.build(def).await.unwrap();

    assert_eq!(first, second);
  }

  #[tokio::test]
  async fn build_fails_on_duplicate_task_id() {
    let builder = StandardBuilder::new(registry_with_daylight());
    let result = builder
      .build(make_def(vec![template_task("sim"), template_task("sim")]))
      .await;

    assert!(matches!(
      result,
      Err(BuildError::DuplicateIdentifier { name }) if name == "sim"
    ));
  }

  #[tokio::test]
  async fn build_fails_on_duplicate_input_name() {
    let builder = StandardBuilder::new(registry_with_daylight());
    let mut def = make_def(vec![template_task("sim")]);
    def.inputs.push(model_input());

    let result = builder.build(def).await;
    assert!(matches!(
      result,
      Err(BuildError::DuplicateIdentifier { name }) if name == "model"
    ));
  }

  #[tokio::test]
  async fn build_fails_on_missing_template() {
    let builder = StandardBuilder::new(MemoryTemplateRegistry::new());
    let result = builder.build(make_def(vec![template_task("sim")])).await;

    assert!(matches!(
      result,
      Err(BuildError::TemplateVersionNotFound { .. })
    ));
  }

  #[tokio::test]
  async fn build_fails_on_unknown_workflow_input() {
    let builder = StandardBuilder::new(registry_with_daylight());
    let mut task = template_task("sim");
    task.params.insert(
      "north".to_string(),
      BindingDef::Input {
        input: "south".to_string(),
      },
    );

    let result = builder.build(make_def(vec![task])).await;
    assert!(matches!(
      result,
      Err(BuildError::UnknownInput { input, .. }) if input == "south"
    ));
  }

  #[tokio::test]
  async fn build_fails_on_binding_not_covered_by_needs() {
    let builder = StandardBuilder::new(registry_with_daylight());

    let mut consumer = operation_task("consumer", &[], &[]);
    consumer.params.insert(
      "folder".to_string(),
      BindingDef::TaskOutput {
        task: "producer".to_string(),
        output: "results".to_string(),
      },
    );

    let result = builder
      .build(make_def(vec![template_task("producer"), consumer]))
      .await;

    assert!(matches!(
      result,
      Err(BuildError::InconsistentDependency { task_id, dependency })
        if task_id == "consumer" && dependency == "producer"
    ));
  }

  #[tokio::test]
  async fn build_fails_on_binding_to_later_task() {
    let builder = StandardBuilder::new(registry_with_daylight());

    let mut consumer = operation_task("consumer", &["producer"], &[]);
    consumer.params.insert(
      "folder".to_string(),
      BindingDef::TaskOutput {
        task: "producer".to_string(),
        output: "results".to_string(),
      },
    );

    let result = builder
      .build(make_def(vec![consumer, template_task("producer")]))
      .await;

    assert!(matches!(result, Err(BuildError::ForwardReference { .. })));
  }

  #[tokio::test]
  async fn build_fails_on_unknown_rename_source() {
    let builder = StandardBuilder::new(registry_with_daylight());
    let mut task = template_task("sim");
    task.outputs.push(OutputRename {
      from: "nope".to_string(),
      to: "alias".to_string(),
    });

    let result = builder.build(make_def(vec![task])).await;
    assert!(matches!(
      result,
      Err(BuildError::UnknownOutput { output, .. }) if output == "nope"
    ));
  }

  #[tokio::test]
  async fn build_fails_on_invalid_literal() {
    let builder = StandardBuilder::new(registry_with_daylight());
    let mut task = template_task("sim");
    task.params.insert(
      "north".to_string(),
      BindingDef::Literal { value: json!(400) },
    );

    let result = builder.build(make_def(vec![task])).await;
    assert!(matches!(
      result,
      Err(BuildError::InvalidParameter { parameter, .. }) if parameter == "north"
    ));
  }

  #[tokio::test]
  async fn build_fails_on_unbound_required_parameter() {
    let builder = StandardBuilder::new(registry_with_daylight());
    let mut task = template_task("sim");
    task.params.remove("model");

    let result = builder.build(make_def(vec![task])).await;
    assert!(matches!(
      result,
      Err(BuildError::UnboundParameter { parameter, .. }) if parameter == "model"
    ));
  }

  #[tokio::test]
  async fn build_fails_on_unknown_template_parameter() {
    let builder = StandardBuilder::new(registry_with_daylight());
    let mut task = template_task("sim");
    task.params.insert(
      "mystery".to_string(),
      BindingDef::Literal { value: json!(1) },
    );

    let result = builder.build(make_def(vec![task])).await;
    assert!(matches!(
      result,
      Err(BuildError::UnknownParameter { parameter, .. }) if parameter == "mystery"
    ));
  }

  #[tokio::test]
  async fn build_resolves_renamed_outputs_for_workflow_outputs() {
    let builder = StandardBuilder::new(registry_with_daylight());
    let mut task = template_task("sim");
    task.outputs.push(OutputRename {
      from: "results".to_string(),
      to: "summary".to_string(),
    });

    let mut def = make_def(vec![task]);
    def.outputs.push(OutputSpec {
      name: "summary".to_string(),
      kind: ValueKind::Folder,
      source: OutputSource::Task {
        task: "sim".to_string(),
        output: "summary".to_string(),
      },
      description: String::new(),
      alias: None,
    });

    let graph = builder.build(def).await.unwrap();
    assert!(graph.tasks[0].exposes("summary"));
  }

  #[tokio::test]
  async fn build_fails_on_output_sourcing_unknown_task() {
    let builder = StandardBuilder::new(registry_with_daylight());
    let mut def = make_def(vec![template_task("sim")]);
    def.outputs.push(OutputSpec {
      name: "summary".to_string(),
      kind: ValueKind::Folder,
      source: OutputSource::Task {
        task: "ghost".to_string(),
        output: "results".to_string(),
      },
      description: String::new(),
      alias: None,
    });

    let result = builder.build(def).await;
    assert!(matches!(
      result,
      Err(BuildError::UnknownOutputSource { task, .. }) if task == "ghost"
    ));
  }
}
