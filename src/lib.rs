use std::path::{Path, PathBuf};

use crate::domain::benchmark::params::BenchmarkParams;
use crate::domain::benchmark::workflow_benchmark::WorkflowBenchmark;
use crate::domain::executor::local_executor::{ExecutorConfig, LocalExecutor};
use crate::domain::executor::run_summary::RunReport;
use crate::domain::recipe::recipe::Recipe;
use crate::domain::topology::TopologyFile;
use crate::error::Result;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Generates and assembles a benchmark from a topology file and a recipe file, returning the written JSON path.
pub fn generate_benchmark(
    topology_path: impl AsRef<Path>,
    recipe_path: impl AsRef<Path>,
    num_tasks: usize,
    program: impl Into<PathBuf>,
    save_dir: impl AsRef<Path>,
    params: &BenchmarkParams,
) -> Result<PathBuf> {
    let recipe = Recipe::from_file(recipe_path)?;
    log::info!("Recipe parsed successfully.");

    let provider = TopologyFile::new(topology_path.as_ref());
    let mut benchmark = WorkflowBenchmark::new(Box::new(provider), recipe, num_tasks, program);
    benchmark.create_benchmark(save_dir.as_ref(), params, false)
}

/// Executes a benchmark document with the default executor configuration.
pub async fn run_benchmark(json_path: impl AsRef<Path>, work_dir: impl AsRef<Path>) -> Result<RunReport> {
    LocalExecutor::new(ExecutorConfig::default()).run(json_path.as_ref(), work_dir.as_ref()).await
}
