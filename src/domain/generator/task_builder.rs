use std::collections::{BTreeMap, HashMap};

use crate::domain::file::{File, FileLink};
use crate::domain::generator::task_id::TaskIdGenerator;
use crate::domain::id::{NodeId, TaskName};
use crate::domain::recipe::distribution::DistributionSpec;
use crate::domain::recipe::recipe::Recipe;
use crate::domain::recipe::recipe_sampler::RecipeSampler;
use crate::domain::task::Task;
use crate::domain::task_graph::TaskGraph;
use crate::domain::topology::{Topology, TopologyNode};
use crate::error::Result;

/// How many files to synthesize per (link, extension). Unlisted combinations get one file.
#[derive(Debug, Clone, Default)]
pub struct FileCounts {
    counts: HashMap<(FileLink, String), usize>,
}

impl FileCounts {
    pub fn with(mut self, link: FileLink, extension: impl Into<String>, count: usize) -> Self {
        self.counts.insert((link, extension.into()), count);
        self
    }

    pub fn count(&self, link: FileLink, extension: &str) -> usize {
        self.counts.get(&(link, extension.to_string())).copied().unwrap_or(1)
    }
}

/// Instantiates a topology template against a recipe.
///
/// Every node becomes one task with a sampled runtime. A task first inherits its parents' outputs as inputs, then
/// receives freshly named files for each recipe extension it does not have yet on that link.
pub struct SyntheticTaskBuilder<'a> {
    recipe: &'a Recipe,
    sampler: RecipeSampler,
    ids: TaskIdGenerator,
    file_counts: FileCounts,
}

impl<'a> SyntheticTaskBuilder<'a> {
    pub fn new(recipe: &'a Recipe) -> Self {
        SyntheticTaskBuilder {
            recipe,
            sampler: RecipeSampler::new(),
            ids: TaskIdGenerator::new(),
            file_counts: FileCounts::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.sampler = RecipeSampler::seeded(seed);
        self
    }

    pub fn with_file_counts(mut self, file_counts: FileCounts) -> Self {
        self.file_counts = file_counts;
        self
    }

    pub fn build(&mut self, topology: &Topology) -> Result<TaskGraph> {
        let mut graph = TaskGraph::new(topology.name.clone());
        let mut names: HashMap<&NodeId, TaskName> = HashMap::new();

        for index in topology.dependency_order() {
            let node = &topology.nodes[index];

            let inherited: Vec<File> = node
                .parents
                .iter()
                .filter_map(|parent| names.get(parent))
                .filter_map(|parent| graph.task(parent))
                .flat_map(|parent| parent.output_files())
                .map(|f| File::input(f.name.clone(), f.size))
                .collect();

            let task = self.build_task(node, inherited)?;
            log::debug!("Generated task '{}' with {} files", task.name, task.files().len());

            names.insert(&node.id, task.name.clone());
            graph.add_task(task)?;
        }

        for node in &topology.nodes {
            for child in &node.children {
                if let (Some(parent), Some(child)) = (names.get(&node.id), names.get(child)) {
                    graph.add_edge(parent, child)?;
                }
            }
        }

        log::info!("Built workflow '{}' with {} tasks", graph.name, graph.len());
        Ok(graph)
    }

    fn build_task(&mut self, node: &TopologyNode, inherited: Vec<File>) -> Result<Task> {
        let task_recipe = self.recipe.task_recipe(&node.category)?;
        let runtime = self.sampler.sample_runtime(&task_recipe.runtime)?;

        let (name, id) = self.ids.next_name(&node.category);
        let mut task = Task::new(name, id, node.category.clone(), runtime);

        for file in inherited {
            task.add_file(file);
        }

        self.generate_files(&mut task, &task_recipe.input, FileLink::Input)?;
        self.generate_files(&mut task, &task_recipe.output, FileLink::Output)?;
        Ok(task)
    }

    fn generate_files(&mut self, task: &mut Task, recipe: &BTreeMap<String, DistributionSpec>, link: FileLink) -> Result<()> {
        let missing: Vec<(&String, &DistributionSpec)> =
            recipe.iter().filter(|(extension, _)| !task.has_extension(link, extension)).collect();

        for (extension, spec) in missing {
            for _ in 0..self.file_counts.count(link, extension) {
                let name = format!("{}{}", self.sampler.random_uuid(), extension);
                let size = self.sampler.sample_size(spec)?;
                task.add_file(File::new(name, size, link));
            }
        }
        Ok(())
    }
}
