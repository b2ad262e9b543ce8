use std::collections::{BTreeMap, HashMap};

use crate::domain::benchmark::params::DataFootprint;
use crate::domain::file::File;
use crate::domain::id::TaskName;
use crate::domain::task_graph::TaskGraph;
use crate::error::{Error, Result};

const BYTES_PER_MEGABYTE: f64 = 1_000_000.0;

/// How an edge's file is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileNaming {
    /// One output per producer, read by every child: `<producer>_output.txt`.
    Shared,
    /// One output per edge: `<producer>_<consumer>_output.txt`.
    PerEdge,
}

impl FileNaming {
    pub fn output_name(&self, producer: &TaskName, consumer: &TaskName) -> String {
        match self {
            FileNaming::Shared => format!("{}_output.txt", producer),
            FileNaming::PerEdge => format!("{}_{}_output.txt", producer, consumer),
        }
    }
}

pub fn root_input_name(task: &TaskName) -> String {
    format!("{}_input.txt", task)
}

/// Bytes per (producer, consumer) edge plus the sizes of the system-provided root inputs.
///
/// A leaf has a single self-edge (task, task) for its final output. Both footprint policies fill this one
/// structure, so output names, `--out` maps and consumer inputs are derived the same way.
#[derive(Debug, Clone)]
pub struct EdgeSizes {
    pub naming: FileNaming,
    sizes: HashMap<(TaskName, TaskName), u64>,
    root_inputs: HashMap<TaskName, u64>,
}

impl EdgeSizes {
    pub fn plan(graph: &TaskGraph, footprint: &DataFootprint) -> Result<Self> {
        match footprint {
            DataFootprint::TotalMegabytes(megabytes) => Ok(Self::uniform(graph, *megabytes)),
            DataFootprint::PerCategory(sizes) => Self::per_category(graph, sizes),
        }
    }

    /// Every root needs a system input and an output, every other task only an output.
    pub fn file_counts(graph: &TaskGraph) -> (usize, usize) {
        let roots = graph.roots().count();
        let total_files = 2 * roots + (graph.len() - roots);
        (roots, total_files)
    }

    fn uniform(graph: &TaskGraph, megabytes: u64) -> Self {
        let (roots, total_files) = Self::file_counts(graph);
        let file_size = if total_files == 0 {
            0
        } else {
            (megabytes as f64 * BYTES_PER_MEGABYTE / total_files as f64).round() as u64
        };
        log::debug!("{} system input files, {} files in total, {} bytes each", roots, total_files, file_size);

        let mut edge_sizes = EdgeSizes { naming: FileNaming::Shared, sizes: HashMap::new(), root_inputs: HashMap::new() };
        for task in graph.tasks() {
            for consumer in Self::consumers(graph, &task.name) {
                edge_sizes.sizes.insert((task.name.clone(), consumer), file_size);
            }
            if graph.is_root(&task.name) {
                edge_sizes.root_inputs.insert(task.name.clone(), file_size);
            }
        }
        edge_sizes
    }

    fn per_category(graph: &TaskGraph, sizes: &HashMap<String, u64>) -> Result<Self> {
        let size_of = |task: &TaskName| -> Result<u64> {
            let category = graph.task(task).map(|t| t.category.as_str()).unwrap_or_default();
            sizes
                .get(category)
                .copied()
                .ok_or_else(|| Error::ConfigurationError(format!("Unknown category '{}' in data size mapping", category)))
        };

        let mut edge_sizes = EdgeSizes { naming: FileNaming::PerEdge, sizes: HashMap::new(), root_inputs: HashMap::new() };
        for task in graph.tasks() {
            // Output size is set by the consumer: it describes how much that category ingests.
            for consumer in Self::consumers(graph, &task.name) {
                let size = size_of(&consumer)?;
                edge_sizes.sizes.insert((task.name.clone(), consumer), size);
            }
            if graph.is_root(&task.name) {
                edge_sizes.root_inputs.insert(task.name.clone(), size_of(&task.name)?);
            }
        }

        let categories = graph.categories();
        for category in sizes.keys() {
            if !categories.contains(category.as_str()) {
                log::debug!("Data size given for category '{}' which is not part of the workflow", category);
            }
        }
        Ok(edge_sizes)
    }

    /// Children of `task`, or the task itself for a leaf.
    fn consumers(graph: &TaskGraph, task: &TaskName) -> Vec<TaskName> {
        let children = graph.children(task);
        if children.is_empty() { vec![task.clone()] } else { children.to_vec() }
    }

    pub fn size(&self, producer: &TaskName, consumer: &TaskName) -> Option<u64> {
        self.sizes.get(&(producer.clone(), consumer.clone())).copied()
    }

    /// Distinct output names of `producer` with their sizes. This is the task's `--out` map.
    pub fn outputs_of(&self, graph: &TaskGraph, producer: &TaskName) -> BTreeMap<String, u64> {
        Self::consumers(graph, producer)
            .iter()
            .filter_map(|consumer| {
                self.size(producer, consumer).map(|size| (self.naming.output_name(producer, consumer), size))
            })
            .collect()
    }

    /// Input files of `consumer`: the root input for a root, otherwise one file per parent named exactly like that
    /// parent's output for this edge.
    pub fn inputs_of(&self, graph: &TaskGraph, consumer: &TaskName) -> Vec<File> {
        if let Some(&size) = self.root_inputs.get(consumer) {
            return vec![File::input(root_input_name(consumer), size)];
        }

        graph
            .parents(consumer)
            .iter()
            .filter_map(|producer| {
                self.size(producer, consumer).map(|size| File::input(self.naming.output_name(producer, consumer), size))
            })
            .collect()
    }

    /// Size of the system-provided input of a root task, `None` for every other task.
    pub fn root_input_size(&self, task: &TaskName) -> Option<u64> {
        self.root_inputs.get(task).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::Task;

    /// A -> B, A -> C, B -> D
    fn graph() -> TaskGraph {
        let mut graph = TaskGraph::new("Test");
        for (name, category) in [("A", "a"), ("B", "b"), ("C", "c"), ("D", "d")] {
            graph.add_task(Task::new(TaskName::new(name), "0", category, 0.0)).unwrap();
        }
        for (parent, child) in [("A", "B"), ("A", "C"), ("B", "D")] {
            graph.add_edge(&TaskName::new(parent), &TaskName::new(child)).unwrap();
        }
        graph
    }

    fn name(n: &str) -> TaskName {
        TaskName::new(n)
    }

    #[test]
    fn test_per_category_sizes_follow_consumer() {
        let graph = graph();
        let sizes = HashMap::from([("a".to_string(), 400), ("b".to_string(), 100), ("c".to_string(), 200), ("d".to_string(), 50)]);
        let edges = EdgeSizes::plan(&graph, &DataFootprint::PerCategory(sizes)).unwrap();

        let a_out = edges.outputs_of(&graph, &name("A"));
        assert_eq!(a_out.get("A_B_output.txt"), Some(&100));
        assert_eq!(a_out.get("A_C_output.txt"), Some(&200));
        assert_eq!(edges.outputs_of(&graph, &name("B")), BTreeMap::from([("B_D_output.txt".to_string(), 50)]));
        assert_eq!(edges.outputs_of(&graph, &name("D")), BTreeMap::from([("D_D_output.txt".to_string(), 50)]));
        assert_eq!(edges.outputs_of(&graph, &name("C")), BTreeMap::from([("C_C_output.txt".to_string(), 200)]));

        assert_eq!(edges.inputs_of(&graph, &name("A")), vec![File::input("A_input.txt", 400)]);
        assert_eq!(edges.inputs_of(&graph, &name("D")), vec![File::input("B_D_output.txt", 50)]);
    }

    #[test]
    fn test_per_category_missing_category_fails() {
        let graph = graph();
        let sizes = HashMap::from([("b".to_string(), 100), ("c".to_string(), 200), ("d".to_string(), 50)]);
        let result = EdgeSizes::plan(&graph, &DataFootprint::PerCategory(sizes));
        assert!(matches!(result, Err(Error::ConfigurationError(msg)) if msg.contains("'a'")));
    }

    #[test]
    fn test_uniform_sizes_and_shared_names() {
        let graph = graph();
        // 1 root: 2 * 1 + 3 = 5 files, 1 MB / 5
        let edges = EdgeSizes::plan(&graph, &DataFootprint::TotalMegabytes(1)).unwrap();
        assert_eq!(EdgeSizes::file_counts(&graph), (1, 5));

        assert_eq!(edges.outputs_of(&graph, &name("A")), BTreeMap::from([("A_output.txt".to_string(), 200_000)]));
        assert_eq!(edges.inputs_of(&graph, &name("A")), vec![File::input("A_input.txt", 200_000)]);
        assert_eq!(edges.inputs_of(&graph, &name("C")), vec![File::input("A_output.txt", 200_000)]);
        assert_eq!(edges.outputs_of(&graph, &name("D")), BTreeMap::from([("D_output.txt".to_string(), 200_000)]));
    }

    #[test]
    fn test_uniform_sizes_round_to_nearest_byte() {
        let graph = graph();
        // 7 MB over 5 files
        let edges = EdgeSizes::plan(&graph, &DataFootprint::TotalMegabytes(7)).unwrap();
        assert_eq!(edges.size(&name("A"), &name("B")), Some(1_400_000));

        let mut three = TaskGraph::new("Three");
        for n in ["x", "y", "z"] {
            three.add_task(Task::new(name(n), "0", "c", 0.0)).unwrap();
        }
        // 3 roots: 6 files, 1 MB / 6 = 166666.67
        let edges = EdgeSizes::plan(&three, &DataFootprint::TotalMegabytes(1)).unwrap();
        assert_eq!(edges.size(&name("x"), &name("x")), Some(166_667));
    }

    #[test]
    fn test_zero_footprint_gives_zero_byte_files() {
        let graph = graph();
        let edges = EdgeSizes::plan(&graph, &DataFootprint::TotalMegabytes(0)).unwrap();
        assert_eq!(edges.root_input_size(&name("A")), Some(0));
        assert_eq!(edges.root_input_size(&name("B")), None);
        assert_eq!(edges.size(&name("B"), &name("D")), Some(0));
    }
}
