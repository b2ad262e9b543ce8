use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::Result;

/// One launched task as observed by the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub task: String,
    pub pid: Option<u32>,
    pub launched_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub exit_code: Option<i32>,
}

impl TaskRecord {
    pub fn launched(task: impl Into<String>, pid: Option<u32>) -> Self {
        TaskRecord { task: task.into(), pid, launched_at: Local::now(), finished_at: None, exit_code: None }
    }

    pub fn finish(&mut self, exit_code: Option<i32>) {
        self.finished_at = Some(Local::now());
        self.exit_code = exit_code;
    }

    pub fn elapsed_ms(&self) -> Option<i64> {
        self.finished_at.map(|finished| (finished - self.launched_at).num_milliseconds())
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Outcome of a successful local run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub records: Vec<TaskRecord>,
    pub run_log: PathBuf,
    pub summary: PathBuf,
}

impl RunReport {
    pub fn record(&self, task: &str) -> Option<&TaskRecord> {
        self.records.iter().find(|r| r.task == task)
    }
}

/// Writes `task;pid;launched_at;finished_at;elapsed_ms;exit_code` rows, one per record.
pub fn write_run_summary(path: &Path, records: &[TaskRecord]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_path(path).map_err(std::io::Error::from)?;

    writer
        .write_record(["task", "pid", "launched_at", "finished_at", "elapsed_ms", "exit_code"])
        .map_err(std::io::Error::from)?;

    for record in records {
        let row = [
            record.task.clone(),
            record.pid.map(|p| p.to_string()).unwrap_or_default(),
            record.launched_at.to_rfc3339(),
            record.finished_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            record.elapsed_ms().map(|ms| ms.to_string()).unwrap_or_default(),
            record.exit_code.map(|c| c.to_string()).unwrap_or_default(),
        ];
        writer.write_record(&row).map_err(std::io::Error::from)?;
    }

    writer.flush()?;
    Ok(())
}
