use std::collections::{BTreeSet, HashMap};

use chrono::Local;

use crate::api::benchmark_dto::{CommandDto, SCHEMA_VERSION, TaskDto, WorkflowBenchmarkDto, WorkflowDto};
use crate::domain::file::File;
use crate::domain::id::TaskName;
use crate::domain::task::{Command, Task};
use crate::error::Error;

/// Tasks plus their parent/child adjacency.
///
/// Tasks keep insertion order so that persisted documents are stable. The adjacency is fixed once the builder has
/// added all edges.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    pub name: String,

    tasks: Vec<Task>,
    index: HashMap<TaskName, usize>,
    parents: HashMap<TaskName, Vec<TaskName>>,
    children: HashMap<TaskName, Vec<TaskName>>,
}

impl TaskGraph {
    pub fn new(name: impl Into<String>) -> Self {
        TaskGraph { name: name.into(), ..Default::default() }
    }

    pub fn add_task(&mut self, task: Task) -> Result<(), Error> {
        if self.index.contains_key(&task.name) {
            return Err(Error::ModelConstructionError(format!("Duplicate task name '{}'", task.name)));
        }

        self.parents.insert(task.name.clone(), Vec::new());
        self.children.insert(task.name.clone(), Vec::new());
        self.index.insert(task.name.clone(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    pub fn add_edge(&mut self, parent: &TaskName, child: &TaskName) -> Result<(), Error> {
        for name in [parent, child] {
            if !self.index.contains_key(name) {
                return Err(Error::ModelConstructionError(format!("Edge references unknown task '{}'", name)));
            }
        }

        let children = self.children.entry(parent.clone()).or_default();
        if !children.contains(child) {
            children.push(child.clone());
            self.parents.entry(child.clone()).or_default().push(parent.clone());
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn tasks_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.tasks.iter_mut()
    }

    pub fn task(&self, name: &TaskName) -> Option<&Task> {
        self.index.get(name).map(|&i| &self.tasks[i])
    }

    pub fn task_mut(&mut self, name: &TaskName) -> Option<&mut Task> {
        self.index.get(name).map(|&i| &mut self.tasks[i])
    }

    pub fn parents(&self, name: &TaskName) -> &[TaskName] {
        self.parents.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn children(&self, name: &TaskName) -> &[TaskName] {
        self.children.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_root(&self, name: &TaskName) -> bool {
        self.parents(name).is_empty()
    }

    pub fn is_leaf(&self, name: &TaskName) -> bool {
        self.children(name).is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| self.is_root(&t.name))
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| self.is_leaf(&t.name))
    }

    pub fn categories(&self) -> BTreeSet<&str> {
        self.tasks.iter().map(|t| t.category.as_str()).collect()
    }

    /// Converts the graph into the persisted benchmark document.
    pub fn to_dto(&self) -> WorkflowBenchmarkDto {
        let tasks = self
            .tasks
            .iter()
            .map(|task| TaskDto {
                name: task.name.to_string(),
                id: task.id.clone(),
                category: task.category.clone(),
                typ: "compute".to_string(),
                command: CommandDto { program: task.command.program.clone(), arguments: task.command.arguments.clone() },
                parents: self.parents(&task.name).iter().map(ToString::to_string).collect(),
                children: self.children(&task.name).iter().map(ToString::to_string).collect(),
                files: task.files().iter().map(Into::into).collect(),
                runtime: task.runtime,
                cores: 1,
            })
            .collect();

        WorkflowBenchmarkDto {
            name: self.name.clone(),
            description: format!("Synthetic benchmark instance of {} with {} tasks.", self.name, self.len()),
            created_at: Local::now().to_rfc3339(),
            schema_version: SCHEMA_VERSION.to_string(),
            workflow: WorkflowDto { makespan: 0.0, tasks },
        }
    }
}

/// Rebuilds a graph from a persisted document. Adjacency is taken from the `parents` lists.
impl TryFrom<WorkflowBenchmarkDto> for TaskGraph {
    type Error = Error;

    fn try_from(dto: WorkflowBenchmarkDto) -> Result<Self, Self::Error> {
        let mut graph = TaskGraph::new(dto.name);
        let mut edges = Vec::new();

        for task_dto in dto.workflow.tasks {
            let name = TaskName::new(task_dto.name);
            let mut task = Task::new(name.clone(), task_dto.id, task_dto.category, task_dto.runtime);
            task.command = Command { program: task_dto.command.program, arguments: task_dto.command.arguments };

            for file_dto in task_dto.files {
                let file = File::from(file_dto);
                let file_name = file.name.clone();
                if !task.add_file(file) {
                    return Err(Error::ModelConstructionError(format!(
                        "Task '{}' lists file '{}' twice",
                        name, file_name
                    )));
                }
            }

            edges.extend(task_dto.parents.into_iter().map(|parent| (TaskName::new(parent), name.clone())));
            graph.add_task(task)?;
        }

        for (parent, child) in &edges {
            graph.add_edge(parent, child)?;
        }
        Ok(graph)
    }
}
