pub mod cleanup;
pub mod local_executor;
pub mod run_summary;

/// Environment variable telling the workload program where to write its outputs.
pub const OUTPUT_DIR_ENV: &str = "WFBENCH_OUTPUT_DIR";
