pub mod assembler;
pub mod edge_sizes;
pub mod lock_files;
pub mod params;
pub mod root_inputs;
pub mod workflow_benchmark;
