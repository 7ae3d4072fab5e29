use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use trellis_builder::{GraphBuilder, StandardBuilder};
use trellis_config::WorkflowDef;
use trellis_graph::{WorkflowGraph, plan};
use trellis_template::FsTemplateRegistry;

/// Trellis - a DAG workflow-composition engine
#[derive(Parser)]
#[command(name = "trellis")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the template catalog (default: ~/.trellis/templates)
  #[arg(long, global = true)]
  templates: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Validate a workflow definition against the template catalog
  Validate {
    /// Path to the workflow definition file (JSON)
    workflow_file: PathBuf,
  },

  /// Resolve a workflow definition and print its execution plan
  Plan {
    /// Path to the workflow definition file (JSON)
    workflow_file: PathBuf,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();

  let templates_dir = cli.templates.unwrap_or_else(|| {
    dirs::home_dir()
      .expect("could not determine home directory")
      .join(".trellis")
      .join("templates")
  });

  let rt = tokio::runtime::Runtime::new()?;

  match cli.command {
    Some(Commands::Validate { workflow_file }) => {
      rt.block_on(validate(workflow_file, templates_dir))?;
    }
    Some(Commands::Plan { workflow_file }) => {
      rt.block_on(print_plan(workflow_file, templates_dir))?;
    }
    None => {
      println!("trellis - use --help to see available commands");
    }
  }

  Ok(())
}

async fn validate(workflow_file: PathBuf, templates_dir: PathBuf) -> Result<()> {
  let graph = load_graph(&workflow_file, &templates_dir).await?;

  let plan = plan::resolve(&graph).context("failed to resolve execution plan")?;

  eprintln!(
    "Workflow '{}' is valid: {} tasks, {} inputs, {} outputs",
    graph.name,
    plan.order.len(),
    graph.inputs.len(),
    graph.outputs.len()
  );

  Ok(())
}

async fn print_plan(workflow_file: PathBuf, templates_dir: PathBuf) -> Result<()> {
  let graph = load_graph(&workflow_file, &templates_dir).await?;

  let plan = plan::resolve(&graph).context("failed to resolve execution plan")?;

  println!("{}", serde_json::to_string_pretty(&plan)?);

  Ok(())
}

async fn load_graph(workflow_file: &PathBuf, templates_dir: &PathBuf) -> Result<WorkflowGraph> {
  let content = tokio::fs::read_to_string(workflow_file)
    .await
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  let def: WorkflowDef = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))?;

  eprintln!("Loaded workflow: {}", def.name);

  let registry = FsTemplateRegistry::new(templates_dir);
  let builder = StandardBuilder::new(registry);

  builder
    .build(def)
    .await
    .context("failed to build workflow graph")
}
