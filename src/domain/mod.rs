pub mod benchmark;
pub mod executor;
pub mod file;
pub mod generator;
pub mod id;
pub mod recipe;
pub mod task;
pub mod task_graph;
pub mod topology;
