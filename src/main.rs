use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use wfsynth::domain::benchmark::params::{BenchmarkParams, DataFootprint, DEFAULT_PERCENT_CPU, ParamValue};
use wfsynth::domain::benchmark::workflow_benchmark::WorkflowBenchmark;
use wfsynth::domain::executor::local_executor::{ExecutorConfig, LocalExecutor};
use wfsynth::domain::recipe::recipe::Recipe;
use wfsynth::domain::topology::TopologyFile;
use wfsynth::logger;

const WORKLOAD_PROGRAM: &str = "wfbench";

/// Synthetic workflow benchmark generator and local runner
#[derive(Parser, Debug)]
#[command(name = "wfsynth")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Where the topology comes from and how big the workflow should be.
#[derive(clap::Args, Debug)]
struct Source {
    /// Topology template (JSON)
    #[arg(long, value_name = "PATH")]
    topology: PathBuf,

    /// Task recipe (JSON)
    #[arg(long, value_name = "PATH")]
    recipe: PathBuf,

    /// Requested number of tasks
    #[arg(long, value_name = "N")]
    num_tasks: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a workflow and write the benchmark JSON
    Create {
        #[command(flatten)]
        source: Source,

        /// Directory receiving the JSON and the root input files
        #[arg(long, value_name = "DIR", default_value = ".")]
        save_dir: PathBuf,

        /// Parameter file; overrides the single-value flags below
        #[arg(long, value_name = "PATH")]
        params: Option<PathBuf>,

        #[arg(long, default_value_t = DEFAULT_PERCENT_CPU)]
        percent_cpu: f64,

        #[arg(long)]
        cpu_work: Option<u64>,

        #[arg(long)]
        gpu_work: Option<u64>,

        /// Total data footprint in MB
        #[arg(long, value_name = "MB")]
        data: Option<u64>,

        /// Directory for the core lock files shared by CPU-bound tasks
        #[arg(long, value_name = "DIR")]
        lock_dir: Option<PathBuf>,

        /// Seed for reproducible generation
        #[arg(long)]
        seed: Option<u64>,

        /// Workload program every task runs; defaults to `wfbench` next to this executable
        #[arg(long, value_name = "PATH")]
        program: Option<PathBuf>,
    },

    /// Run a benchmark JSON on this machine
    Run {
        /// Benchmark document produced by `create`
        json: PathBuf,

        /// Directory holding the root inputs; tasks write their outputs here
        #[arg(long, value_name = "DIR", default_value = ".")]
        work_dir: PathBuf,

        /// Poll interval in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 1000)]
        poll_ms: u64,
    },

    /// Write a parameter file with default values for every category of the topology
    ParamsTemplate {
        #[command(flatten)]
        source: Source,

        #[arg(long, value_name = "PATH", default_value = "params.json")]
        output: PathBuf,
    },
}

fn default_program() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Cannot locate the running executable")?;
    let dir = exe.parent().unwrap_or(Path::new("."));
    Ok(dir.join(WORKLOAD_PROGRAM))
}

fn benchmark(source: &Source, program: PathBuf, seed: Option<u64>) -> Result<WorkflowBenchmark> {
    let recipe = Recipe::from_file(&source.recipe)
        .with_context(|| format!("Failed to load recipe '{}'", source.recipe.display()))?;
    let provider = TopologyFile::new(&source.topology);

    let benchmark = WorkflowBenchmark::new(Box::new(provider), recipe, source.num_tasks, program);
    Ok(match seed {
        Some(seed) => benchmark.with_seed(seed),
        None => benchmark,
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logger::init();
    let args = Args::parse();

    match args.command {
        Commands::Create { source, save_dir, params, percent_cpu, cpu_work, gpu_work, data, lock_dir, seed, program } => {
            let program = match program {
                Some(program) => program,
                None => default_program()?,
            };
            let mut benchmark = benchmark(&source, program, seed)?;

            let json_path = match params {
                Some(params_file) => benchmark.create_benchmark_from_params_file(
                    &save_dir,
                    &params_file,
                    lock_dir.as_deref(),
                    false,
                )?,
                None => {
                    if !(0.0..=1.0).contains(&percent_cpu) {
                        bail!("--percent-cpu must be within [0, 1], got {}", percent_cpu);
                    }
                    let mut params = BenchmarkParams {
                        percent_cpu: ParamValue::Scalar(percent_cpu),
                        cpu_work: cpu_work.map(ParamValue::Scalar),
                        gpu_work: gpu_work.map(ParamValue::Scalar),
                        data: data.map(DataFootprint::TotalMegabytes),
                        lock_files_dir: None,
                    };
                    if let Some(dir) = lock_dir {
                        params = params.with_lock_files_dir(dir);
                    }
                    benchmark.create_benchmark(&save_dir, &params, false)?
                }
            };
            println!("{}", json_path.display());
        }
        Commands::Run { json, work_dir, poll_ms } => {
            let config = ExecutorConfig { poll_interval: Duration::from_millis(poll_ms), ..Default::default() };
            let report = LocalExecutor::new(config).run(&json, &work_dir).await?;
            log::info!("{} tasks finished, summary in '{}'", report.records.len(), report.summary.display());
        }
        Commands::ParamsTemplate { source, output } => {
            let benchmark = benchmark(&source, PathBuf::from(WORKLOAD_PROGRAM), None)?;
            benchmark.write_params_template(&output)?;
            println!("{}", output.display());
        }
    }

    Ok(())
}
