pub mod task_builder;
pub mod task_id;
