use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::params_dto::{BenchmarkParamsDto, ParamValueDto};
use crate::domain::benchmark::assembler::BenchmarkAssembler;
use crate::domain::benchmark::params::{BenchmarkParams, DEFAULT_PERCENT_CPU};
use crate::domain::generator::task_builder::{FileCounts, SyntheticTaskBuilder};
use crate::domain::recipe::recipe::Recipe;
use crate::domain::task_graph::TaskGraph;
use crate::domain::topology::TopologyProvider;
use crate::error::{Error, Result};
use crate::loader::parser::{parse_json_file, write_json_file};

const TEMPLATE_CPU_WORK: u64 = 1000;
const TEMPLATE_GPU_WORK: u64 = 100;
const TEMPLATE_DATA: u64 = 10;

/// Name of the benchmark derived from a template name: `Montage-abc` becomes `Montage-Benchmark`.
pub fn benchmark_name(template_name: &str) -> String {
    let prefix = template_name.split('-').next().unwrap_or(template_name);
    format!("{}-Benchmark", prefix)
}

/// A benchmark in the making: topology source, recipe, size and the workload program every task runs.
///
/// The generated graph is cached, so repeated `create_benchmark` calls only re-parameterize it unless a regeneration
/// is requested.
pub struct WorkflowBenchmark {
    provider: Box<dyn TopologyProvider>,
    recipe: Recipe,
    num_tasks: usize,
    program: PathBuf,
    seed: Option<u64>,
    file_counts: FileCounts,
    workflow: Option<TaskGraph>,
}

impl WorkflowBenchmark {
    pub fn new(provider: Box<dyn TopologyProvider>, recipe: Recipe, num_tasks: usize, program: impl Into<PathBuf>) -> Self {
        WorkflowBenchmark {
            provider,
            recipe,
            num_tasks,
            program: program.into(),
            seed: None,
            file_counts: FileCounts::default(),
            workflow: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_file_counts(mut self, file_counts: FileCounts) -> Self {
        self.file_counts = file_counts;
        self
    }

    pub fn workflow(&self) -> Option<&TaskGraph> {
        self.workflow.as_ref()
    }

    fn generate(&self) -> Result<TaskGraph> {
        let topology = self.provider.topology(self.num_tasks)?;

        let mut builder = SyntheticTaskBuilder::new(&self.recipe).with_file_counts(self.file_counts.clone());
        if let Some(seed) = self.seed {
            builder = builder.with_seed(seed);
        }

        let mut graph = builder.build(&topology)?;
        graph.name = benchmark_name(&topology.name);
        Ok(graph)
    }

    /// Generates (or reuses) the task graph, assembles it with `params` and writes the benchmark JSON.
    ///
    /// Returns the path of the written document, `<save_dir>/<lowercased name>-<num_tasks>.json`.
    pub fn create_benchmark(&mut self, save_dir: &Path, params: &BenchmarkParams, regenerate: bool) -> Result<PathBuf> {
        let graph = match self.workflow.take() {
            Some(graph) if !regenerate => graph,
            _ => self.generate()?,
        };
        let graph = self.workflow.insert(graph);

        fs::create_dir_all(save_dir)?;
        let save_dir = save_dir.canonicalize()?;

        BenchmarkAssembler::new(&self.program).assemble(graph, params, &save_dir)?;

        let json_path = save_dir.join(format!("{}-{}.json", graph.name.to_lowercase(), self.num_tasks));
        write_json_file(&json_path, &graph.to_dto())?;
        log::info!("Saved benchmark '{}' to '{}'", graph.name, json_path.display());

        Ok(json_path)
    }

    /// Same as [`create_benchmark`](Self::create_benchmark) with the parameters read from a parameter file.
    pub fn create_benchmark_from_params_file(
        &mut self,
        save_dir: &Path,
        params_file: &Path,
        lock_files_dir: Option<&Path>,
        regenerate: bool,
    ) -> Result<PathBuf> {
        let dto: BenchmarkParamsDto = parse_json_file(params_file).map_err(|e| match e {
            Error::DeserializationError(e) => {
                Error::ConfigurationError(format!("Malformed parameter file '{}': {}", params_file.display(), e))
            }
            other => other,
        })?;
        let mut params = BenchmarkParams::try_from(dto)?;
        if let Some(dir) = lock_files_dir {
            params = params.with_lock_files_dir(dir);
        }
        self.create_benchmark(save_dir, &params, regenerate)
    }

    /// Writes a parameter file listing every category of the topology with default values, for the operator to edit.
    pub fn write_params_template(&self, path: &Path) -> Result<BenchmarkParamsDto> {
        let topology = self.provider.topology(self.num_tasks)?;
        let categories = topology.categories();

        let per_category = |value: u64| -> ParamValueDto<u64> {
            ParamValueDto::PerCategory(categories.iter().map(|c| (c.to_string(), value)).collect::<BTreeMap<_, _>>())
        };
        let template = BenchmarkParamsDto {
            percent_cpu: Some(ParamValueDto::PerCategory(
                categories.iter().map(|c| (c.to_string(), DEFAULT_PERCENT_CPU)).collect(),
            )),
            cpu_work: Some(per_category(TEMPLATE_CPU_WORK)),
            gpu_work: Some(per_category(TEMPLATE_GPU_WORK)),
            data: Some(per_category(TEMPLATE_DATA)),
        };

        write_json_file(path, &template)?;
        log::info!("Wrote parameter template for {} categories to '{}'", categories.len(), path.display());
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::benchmark_dto::WorkflowBenchmarkDto;
    use crate::api::recipe_dto::RecipeDto;
    use crate::api::topology_dto::TopologyDto;
    use crate::domain::benchmark::params::{DataFootprint, ParamValue};
    use crate::domain::topology::Topology;

    fn topology() -> Topology {
        let dto: TopologyDto = serde_json::from_str(
            r#"{ "name": "Blast-xyz-7", "tasks": [
                { "id": "1", "category": "split", "children": ["2", "3"] },
                { "id": "2", "category": "blastall", "parents": ["1"], "children": ["4"] },
                { "id": "3", "category": "blastall", "parents": ["1"], "children": ["4"] },
                { "id": "4", "category": "cat", "parents": ["2", "3"] } ] }"#,
        )
        .unwrap();
        Topology::try_from(dto).unwrap()
    }

    fn recipe() -> Recipe {
        let dto: RecipeDto = serde_json::from_str(
            r#"{
                "split": { "runtime": { "min": 1, "max": 2 }, "input": { ".fasta": { "min": 10, "max": 20 } },
                           "output": { ".fasta": { "min": 5, "max": 10 } } },
                "blastall": { "runtime": { "min": 5, "max": 50 }, "input": {}, "output": { ".out": { "min": 1, "max": 9 } } },
                "cat": { "runtime": { "min": 1, "max": 1 }, "input": {}, "output": { ".txt": { "min": 1, "max": 1 } } }
            }"#,
        )
        .unwrap();
        Recipe::try_from(dto).unwrap()
    }

    fn benchmark() -> WorkflowBenchmark {
        WorkflowBenchmark::new(Box::new(topology()), recipe(), 4, "/usr/local/bin/wfbench").with_seed(7)
    }

    #[test]
    fn test_benchmark_name_uses_prefix() {
        assert_eq!(benchmark_name("Blast-xyz-7"), "Blast-Benchmark");
        assert_eq!(benchmark_name("Genome"), "Genome-Benchmark");
    }

    #[test]
    fn test_create_benchmark_writes_named_document() {
        let dir = tempfile::tempdir().unwrap();
        let params = BenchmarkParams { data: Some(DataFootprint::TotalMegabytes(1)), ..Default::default() };

        let path = benchmark().create_benchmark(dir.path(), &params, false).unwrap();

        assert_eq!(path.file_name().unwrap(), "blast-benchmark-4.json");
        let dto: WorkflowBenchmarkDto = parse_json_file(&path).unwrap();
        assert_eq!(dto.name, "Blast-Benchmark");
        assert_eq!(dto.workflow.tasks.len(), 4);
        assert!(dto.workflow.tasks.iter().all(|t| t.command.program == "/usr/local/bin/wfbench"));
        assert!(dir.path().join("split_00000001_input.txt").is_file());
    }

    #[test]
    fn test_graph_is_cached_until_regenerate() {
        let dir = tempfile::tempdir().unwrap();
        let mut benchmark = WorkflowBenchmark::new(Box::new(topology()), recipe(), 4, "wfbench");

        benchmark.create_benchmark(dir.path(), &BenchmarkParams::default(), false).unwrap();
        let first: Vec<String> = benchmark.workflow().unwrap().tasks().map(|t| t.name.to_string()).collect();

        benchmark.create_benchmark(dir.path(), &BenchmarkParams::default(), false).unwrap();
        let second: Vec<String> = benchmark.workflow().unwrap().tasks().map(|t| t.name.to_string()).collect();
        assert_eq!(first, second);

        // A regenerated graph restarts its id counter
        benchmark.create_benchmark(dir.path(), &BenchmarkParams::default(), true).unwrap();
        let third: Vec<String> = benchmark.workflow().unwrap().tasks().map(|t| t.name.to_string()).collect();
        assert_eq!(first, third);
    }

    #[test]
    fn test_params_template_round_trips_into_params() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("params.json");

        let template = benchmark().write_params_template(&template_path).unwrap();
        let parsed: BenchmarkParamsDto = parse_json_file(&template_path).unwrap();
        assert_eq!(parsed, template);

        let params = BenchmarkParams::try_from(parsed).unwrap();
        assert_eq!(params.cpu_work.unwrap().resolve("blastall", "cpu_work").unwrap(), 1000);
        assert_eq!(params.percent_cpu.resolve("cat", "percent_cpu").unwrap(), 0.6);
        assert_eq!(params.data, Some(DataFootprint::PerCategory(
            [("split", 10), ("blastall", 10), ("cat", 10)].into_iter().map(|(c, v)| (c.to_string(), v)).collect()
        )));
    }

    #[test]
    fn test_create_from_params_file() {
        let dir = tempfile::tempdir().unwrap();
        let params_path = dir.path().join("params.json");
        fs::write(&params_path, r#"{ "cpu_work": 50, "gpu_work": { "split": 1, "blastall": 2, "cat": 3 } }"#).unwrap();

        let mut benchmark = benchmark();
        let lock_dir = dir.path().join("locks");
        let path = benchmark
            .create_benchmark_from_params_file(&dir.path().join("out"), &params_path, Some(&lock_dir), false)
            .unwrap();

        assert!(path.is_file());
        assert!(lock_dir.join("cores.txt").is_file());
        let cat = benchmark.workflow().unwrap().tasks().find(|t| t.category == "cat").unwrap();
        assert!(cat.command.arguments.ends_with(&["--gpu-work".to_string(), "3".to_string()]));
        assert_eq!(BenchmarkParams::default().percent_cpu, ParamValue::Scalar(0.6));
    }

    #[test]
    fn test_malformed_params_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let params_path = dir.path().join("params.json");
        fs::write(&params_path, r#"{ "percent_cpu": "lots", "data": [1, 2] }"#).unwrap();

        let out = dir.path().join("out");
        let result = benchmark().create_benchmark_from_params_file(&out, &params_path, None, false);

        assert!(matches!(result, Err(Error::ConfigurationError(msg)) if msg.contains("params.json")));
        assert!(!out.exists());
    }

    #[test]
    fn test_missing_params_file_stays_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            benchmark().create_benchmark_from_params_file(dir.path(), &dir.path().join("missing.json"), None, false);
        assert!(matches!(result, Err(Error::IoError(_))));
    }
}
