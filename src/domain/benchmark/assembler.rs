use std::path::{Path, PathBuf};

use crate::domain::benchmark::edge_sizes::{EdgeSizes, FileNaming, root_input_name};
use crate::domain::benchmark::lock_files::LockFiles;
use crate::domain::benchmark::params::BenchmarkParams;
use crate::domain::benchmark::root_inputs;
use crate::domain::file::File;
use crate::domain::id::TaskName;
use crate::domain::task::{Command, Task};
use crate::domain::task_graph::TaskGraph;
use crate::error::Result;

/// What a single task will look like once assembled.
#[derive(Debug)]
struct TaskPlan {
    name: TaskName,
    arguments: Vec<String>,
    files: Vec<File>,
}

/// Side effects of an assembly besides the mutated graph.
#[derive(Debug, Clone, Default)]
pub struct AssembledBenchmark {
    pub naming: Option<FileNaming>,
    pub lock_files: Option<LockFiles>,
    /// Root input files that were written by this assembly (existing ones are not listed).
    pub created_inputs: Vec<PathBuf>,
}

/// Turns a generated task graph into a runnable benchmark.
///
/// Assembly plans every task first, so an unknown category fails before any file is written or any task is
/// touched. Afterwards each task is reset and receives its invocation arguments and exactly the files implied by
/// the footprint policy.
#[derive(Debug, Clone)]
pub struct BenchmarkAssembler {
    program: String,
}

impl BenchmarkAssembler {
    pub fn new(program: impl AsRef<Path>) -> Self {
        BenchmarkAssembler { program: program.as_ref().display().to_string() }
    }

    pub fn assemble(&self, graph: &mut TaskGraph, params: &BenchmarkParams, save_dir: &Path) -> Result<AssembledBenchmark> {
        let edge_sizes = params.data.as_ref().map(|footprint| EdgeSizes::plan(graph, footprint)).transpose()?;
        // Tasks run in their own scratch directories, so lock paths must not be relative.
        let lock_files = params
            .lock_files_dir
            .as_deref()
            .map(|dir| std::path::absolute(dir).map(|dir| LockFiles::in_dir(&dir)))
            .transpose()?;

        let plans = graph
            .tasks()
            .map(|task| self.plan_task(graph, task, params, lock_files.as_ref(), edge_sizes.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        if let Some(lock_files) = &lock_files {
            if let Err(e) = lock_files.create() {
                tracing::warn!(
                    "Could not create lock files ({}). You will need to create them manually: '{}' and '{}'",
                    e,
                    lock_files.lock.display(),
                    lock_files.cores.display()
                );
            }
        }

        for plan in plans {
            if let Some(task) = graph.task_mut(&plan.name) {
                task.runtime = 0.0;
                task.clear_files();
                task.command = Command { program: self.program.clone(), arguments: plan.arguments };
                for file in plan.files {
                    task.add_file(file);
                }
            }
        }

        let mut assembled =
            AssembledBenchmark { naming: edge_sizes.as_ref().map(|e| e.naming), lock_files, created_inputs: Vec::new() };
        if let Some(edge_sizes) = &edge_sizes {
            for root in graph.roots() {
                if let Some(size) = edge_sizes.root_input_size(&root.name) {
                    let path = save_dir.join(root_input_name(&root.name));
                    if root_inputs::materialize(&path, size)? {
                        assembled.created_inputs.push(path);
                    }
                }
            }
        }

        tracing::info!(
            "Assembled {} tasks ({} root inputs written to '{}')",
            graph.len(),
            assembled.created_inputs.len(),
            save_dir.display()
        );
        Ok(assembled)
    }

    fn plan_task(
        &self,
        graph: &TaskGraph,
        task: &Task,
        params: &BenchmarkParams,
        lock_files: Option<&LockFiles>,
        edge_sizes: Option<&EdgeSizes>,
    ) -> Result<TaskPlan> {
        let mut arguments = vec![task.name.to_string()];
        let mut files = Vec::new();

        if let Some(cpu_work) = &params.cpu_work {
            let percent_cpu = params.percent_cpu.resolve(&task.category, "percent_cpu")?;
            let cpu_work = cpu_work.resolve(&task.category, "cpu_work")?;
            arguments.extend(["--percent-cpu".to_string(), percent_cpu.to_string()]);
            arguments.extend(["--cpu-work".to_string(), cpu_work.to_string()]);

            if let Some(lock_files) = lock_files {
                arguments.extend(lock_files.arguments());
            }
        }

        if let Some(gpu_work) = &params.gpu_work {
            let gpu_work = gpu_work.resolve(&task.category, "gpu_work")?;
            arguments.extend(["--gpu-work".to_string(), gpu_work.to_string()]);
        }

        if let Some(edge_sizes) = edge_sizes {
            let outputs = edge_sizes.outputs_of(graph, &task.name);
            arguments.extend(["--out".to_string(), serde_json::to_string(&outputs)?]);
            files.extend(outputs.into_iter().map(|(name, size)| File::output(name, size)));

            let inputs = edge_sizes.inputs_of(graph, &task.name);
            arguments.extend(inputs.iter().map(|f| f.name.clone()));
            files.extend(inputs);
        }

        Ok(TaskPlan { name: task.name.clone(), arguments, files })
    }
}
