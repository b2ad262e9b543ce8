use std::fs;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use futures::future::try_join_all;
use tokio::process::{Child, Command};
use uuid::Uuid;

use crate::api::benchmark_dto::{FileLinkDto, TaskDto, WorkflowBenchmarkDto};
use crate::domain::benchmark::lock_files;
use crate::domain::executor::OUTPUT_DIR_ENV;
use crate::domain::executor::cleanup::cleanup_data_files;
use crate::domain::executor::run_summary::{RunReport, TaskRecord, write_run_summary};
use crate::error::{Error, Result};
use crate::loader::parser::parse_json_file;

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub poll_interval: Duration,
    /// Directory below the work dir holding one scratch directory per launched task.
    pub scratch_dir: String,
    pub run_log: String,
    pub run_summary: String,
    /// Process names killed with `killall` when a run fails.
    pub helper_processes: Vec<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            poll_interval: Duration::from_secs(1),
            scratch_dir: "wfbench_execution".to_string(),
            run_log: "run.txt".to_string(),
            run_summary: "run_summary.csv".to_string(),
            helper_processes: vec!["stress-ng".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Ready,
    Running,
    Done,
    Failed,
}

/// A task of the persisted document as the executor sees it.
#[derive(Debug, Clone)]
struct ExecutableTask {
    name: String,
    program: String,
    arguments: Vec<String>,
    inputs: Vec<String>,
    state: TaskState,
}

impl From<TaskDto> for ExecutableTask {
    fn from(dto: TaskDto) -> Self {
        let inputs = dto.files.into_iter().filter(|f| f.link == FileLinkDto::Input).map(|f| f.name).collect();
        ExecutableTask {
            name: dto.name,
            program: dto.command.program,
            arguments: dto.command.arguments,
            inputs,
            state: TaskState::Pending,
        }
    }
}

impl ExecutableTask {
    fn is_ready(&self, work_dir: &Path) -> bool {
        self.inputs.iter().all(|input| work_dir.join(input).exists())
    }

    fn has_outputs(&self) -> bool {
        self.arguments.iter().any(|a| a == "--out")
    }

    /// Arguments with input names replaced by absolute paths below `work_dir`, since the task runs elsewhere.
    fn resolved_arguments(&self, work_dir: &Path) -> Vec<String> {
        if !self.has_outputs() {
            return self.arguments.clone();
        }

        self.arguments
            .iter()
            .enumerate()
            .map(|(i, arg)| {
                if i > 0 && self.inputs.contains(arg) { work_dir.join(arg).display().to_string() } else { arg.clone() }
            })
            .collect()
    }

    fn flag_value(&self, flag: &str) -> Option<&str> {
        self.arguments.iter().position(|a| a == flag).and_then(|i| self.arguments.get(i + 1)).map(String::as_str)
    }
}

struct RunningTask {
    index: usize,
    child: Child,
    record: TaskRecord,
}

impl RunningTask {
    fn is_finished(&self) -> bool {
        self.record.finished_at.is_some()
    }
}

/// Waits for one process; a non-zero exit fails the whole join without waiting for the others.
async fn wait_for_exit(running: &mut RunningTask) -> Result<()> {
    let status = running.child.wait().await?;
    running.record.finish(status.code());
    if status.success() {
        Ok(())
    } else {
        Err(Error::ExecutionError(format!("Task '{}' exited with {}", running.record.task, status)))
    }
}

/// Everything a run owns, kept outside the coordinator so failures can still be cleaned up.
#[derive(Default)]
struct Run {
    tasks: Vec<ExecutableTask>,
    running: Vec<RunningTask>,
}

impl Run {
    fn pending(&self) -> impl Iterator<Item = &ExecutableTask> {
        self.tasks.iter().filter(|t| t.state == TaskState::Pending)
    }

    /// Records an exit and fails on a non-zero status.
    fn on_exit(&mut self, running: usize, status: ExitStatus) -> Result<()> {
        let entry = &mut self.running[running];
        entry.record.finish(status.code());

        let task = &mut self.tasks[entry.index];
        if status.success() {
            task.state = TaskState::Done;
            log::debug!("Task '{}' finished", task.name);
            Ok(())
        } else {
            task.state = TaskState::Failed;
            Err(Error::ExecutionError(format!("Task '{}' exited with {}", task.name, status)))
        }
    }

    /// Marks every task whose process exited during the final join.
    fn settle_states(&mut self) {
        for running in self.running.iter().filter(|r| r.is_finished()) {
            let task = &mut self.tasks[running.index];
            if task.state == TaskState::Running {
                task.state = if running.record.succeeded() { TaskState::Done } else { TaskState::Failed };
            }
        }
    }

    fn records(&self) -> Vec<TaskRecord> {
        self.running.iter().map(|r| r.record.clone()).collect()
    }

    async fn kill_all(&mut self) {
        for running in self.running.iter_mut().filter(|r| !r.is_finished()) {
            if let Err(e) = running.child.kill().await {
                log::warn!("Could not kill task '{}': {}", running.record.task, e);
            }
            running.record.finish(None);
            self.tasks[running.index].state = TaskState::Failed;
        }
    }
}

/// Runs a benchmark document on the local machine.
///
/// A task is started as soon as all its input files exist in the work dir. The coordinator polls at a fixed interval
/// and never waits on a single process while tasks are still pending.
#[derive(Debug, Clone, Default)]
pub struct LocalExecutor {
    config: ExecutorConfig,
}

impl LocalExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        LocalExecutor { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub async fn run(&self, json_path: &Path, work_dir: &Path) -> Result<RunReport> {
        let work_dir = work_dir.canonicalize().map_err(|e| {
            Error::ExecutionError(format!("Work directory '{}' is not usable: {}", work_dir.display(), e))
        })?;

        let mut run = Run::default();
        let result = self.execute(json_path, &work_dir, &mut run).await;

        if result.is_err() {
            run.kill_all().await;
            self.kill_helpers().await;
        }

        let summary = work_dir.join(&self.config.run_summary);
        if let Err(e) = write_run_summary(&summary, &run.records()) {
            log::warn!("Could not write run summary '{}': {}", summary.display(), e);
        }
        if let Err(e) = cleanup_data_files(&work_dir, &self.config.scratch_dir) {
            log::warn!("Cleanup of '{}' failed: {}", work_dir.display(), e);
        }

        match result {
            Ok(()) => {
                tracing::info!("Workflow '{}' completed: {} tasks", json_path.display(), run.running.len());
                Ok(RunReport { records: run.records(), run_log: work_dir.join(&self.config.run_log), summary })
            }
            Err(e) => {
                tracing::error!("Workflow '{}' failed: {}", json_path.display(), e);
                Err(match e {
                    Error::ExecutionError(reason) => Error::ExecutionError(reason),
                    other => Error::ExecutionError(other.to_string()),
                })
            }
        }
    }

    async fn execute(&self, json_path: &Path, work_dir: &Path, run: &mut Run) -> Result<()> {
        let dto: WorkflowBenchmarkDto = parse_json_file(json_path)?;
        run.tasks = dto.workflow.tasks.into_iter().map(ExecutableTask::from).collect();
        tracing::info!("Running workflow '{}' with {} tasks in '{}'", dto.name, run.tasks.len(), work_dir.display());

        self.prepare_lock_files(&run.tasks)?;

        let run_log = fs::File::create(work_dir.join(&self.config.run_log))?;
        let scratch_root = work_dir.join(&self.config.scratch_dir);

        loop {
            for i in 0..run.running.len() {
                if run.running[i].is_finished() {
                    continue;
                }
                if let Some(status) = run.running[i].child.try_wait()? {
                    run.on_exit(i, status)?;
                }
            }
            let all_exited = run.running.iter().all(RunningTask::is_finished);

            let launched = self.launch_ready(run, work_dir, &scratch_root, &run_log)?;

            let pending: Vec<&str> = run.pending().map(|t| t.name.as_str()).collect();
            if pending.is_empty() {
                break;
            }
            if launched == 0 && all_exited {
                return Err(Error::ExecutionError(format!(
                    "No task can start anymore, {} still waiting for inputs (first: '{}')",
                    pending.len(),
                    pending[0]
                )));
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }

        log::debug!("All tasks launched, waiting for {} processes", run.running.len());
        let joined = try_join_all(run.running.iter_mut().filter(|r| !r.is_finished()).map(wait_for_exit)).await;
        run.settle_states();
        joined.map(|_| ())
    }

    /// Starts every pending task whose inputs exist. Returns how many were started.
    fn launch_ready(&self, run: &mut Run, work_dir: &Path, scratch_root: &Path, run_log: &fs::File) -> Result<usize> {
        let mut launched = 0;
        for index in 0..run.tasks.len() {
            if run.tasks[index].state != TaskState::Pending || !run.tasks[index].is_ready(work_dir) {
                continue;
            }
            // Ready only lasts until the spawn below succeeds.
            run.tasks[index].state = TaskState::Ready;

            let task = &run.tasks[index];
            let child = self.spawn(task, work_dir, scratch_root, run_log)?;
            let record = TaskRecord::launched(task.name.clone(), child.id());
            log::info!("Launched task '{}' (pid {:?})", task.name, record.pid);

            run.tasks[index].state = TaskState::Running;
            run.running.push(RunningTask { index, child, record });
            launched += 1;
        }
        Ok(launched)
    }

    fn spawn(&self, task: &ExecutableTask, work_dir: &Path, scratch_root: &Path, run_log: &fs::File) -> Result<Child> {
        let folder = scratch_root.join(Uuid::new_v4().to_string());
        fs::create_dir_all(&folder)?;

        Command::new(&task.program)
            .args(task.resolved_arguments(work_dir))
            .current_dir(&folder)
            .env(OUTPUT_DIR_ENV, work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(run_log.try_clone()?))
            .stderr(Stdio::from(run_log.try_clone()?))
            .spawn()
            .map_err(|e| Error::ExecutionError(format!("Could not start task '{}' ({}): {}", task.name, task.program, e)))
    }

    /// Lock and core files referenced by any task must exist before the first task starts.
    fn prepare_lock_files(&self, tasks: &[ExecutableTask]) -> Result<()> {
        let mut paths: Vec<PathBuf> = tasks
            .iter()
            .flat_map(|t| [t.flag_value("--path-lock"), t.flag_value("--path-cores")])
            .flatten()
            .map(PathBuf::from)
            .collect();
        paths.sort();
        paths.dedup();

        for path in paths {
            lock_files::touch(&path)?;
        }
        Ok(())
    }

    async fn kill_helpers(&self) {
        for helper in &self.config.helper_processes {
            match Command::new("killall").arg(helper).stdout(Stdio::null()).stderr(Stdio::null()).status().await {
                Ok(status) => log::debug!("killall {} exited with {}", helper, status),
                Err(e) => log::debug!("Could not run killall for '{}': {}", helper, e),
            }
        }
    }
}
