use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: &str = "1.3";

/// The persisted benchmark instance consumed by the local executor.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowBenchmarkDto {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub schema_version: String,

    pub workflow: WorkflowDto,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDto {
    #[serde(default)]
    pub makespan: f64,

    pub tasks: Vec<TaskDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub name: String,

    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub category: String,

    #[serde(rename = "type", default = "default_task_type")]
    pub typ: String,

    pub command: CommandDto,

    #[serde(default)]
    pub parents: Vec<String>,

    #[serde(default)]
    pub children: Vec<String>,

    #[serde(default)]
    pub files: Vec<FileDto>,

    #[serde(default)]
    pub runtime: f64,

    #[serde(default = "default_cores")]
    pub cores: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommandDto {
    pub program: String,

    #[serde(default)]
    pub arguments: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileDto {
    pub name: String,
    pub size: u64,
    pub link: FileLinkDto,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileLinkDto {
    Input,
    Output,
}

fn default_task_type() -> String {
    "compute".to_string()
}

fn default_cores() -> u32 {
    1
}
