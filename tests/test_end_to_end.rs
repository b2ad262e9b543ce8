#![cfg(unix)]

mod common;

use std::fs;
use std::time::Duration;

use tokio::time::timeout;
use wfsynth::api::benchmark_dto::WorkflowBenchmarkDto;
use wfsynth::domain::benchmark::params::{BenchmarkParams, DataFootprint, ParamValue};
use wfsynth::domain::benchmark::workflow_benchmark::WorkflowBenchmark;
use wfsynth::domain::executor::cleanup::is_generated_data_file;
use wfsynth::domain::executor::local_executor::{ExecutorConfig, LocalExecutor};
use wfsynth::loader::parser::parse_json_file;

use common::{file_names, montage_like_topology, recipe};

#[tokio::test]
async fn test_generated_benchmark_runs_with_workload_program() {
    let dir = tempfile::tempdir().unwrap();
    let locks = tempfile::tempdir().unwrap();

    let mut benchmark = WorkflowBenchmark::new(
        Box::new(montage_like_topology()),
        recipe(&["mProject", "mAdd", "mViewer", "mJPEG"]),
        6,
        env!("CARGO_BIN_EXE_wfbench"),
    )
    .with_seed(5);

    let params = BenchmarkParams {
        percent_cpu: ParamValue::Scalar(1.0),
        cpu_work: Some(ParamValue::Scalar(2)),
        gpu_work: None,
        data: Some(DataFootprint::TotalMegabytes(1)),
        lock_files_dir: Some(locks.path().to_path_buf()),
    };
    let json = benchmark.create_benchmark(dir.path(), &params, false).unwrap();

    let dto: WorkflowBenchmarkDto = parse_json_file(&json).unwrap();
    assert_eq!(dto.name, "Montage-Benchmark");
    assert_eq!(json.file_name().unwrap(), "montage-benchmark-6.json");

    let executor = LocalExecutor::new(ExecutorConfig {
        poll_interval: Duration::from_millis(50),
        helper_processes: Vec::new(),
        ..Default::default()
    });
    let report = timeout(Duration::from_secs(60), executor.run(&json, dir.path())).await.unwrap().unwrap();

    assert_eq!(report.records.len(), 6);
    assert!(report.records.iter().all(|r| r.succeeded()));

    let log = fs::read_to_string(&report.run_log).unwrap();
    for task in &dto.workflow.tasks {
        assert!(log.contains(&format!("{} benchmark completed", task.name)), "no completion line for {}", task.name);
    }

    assert!(file_names(dir.path()).iter().all(|name| !is_generated_data_file(name)));
    // every core slot was given back
    assert_eq!(fs::read_to_string(locks.path().join("cores.txt")).unwrap().trim(), "");
}
