use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::api::recipe_dto::{DistributionSpecDto, RecipeDto, TaskRecipeDto};
use crate::domain::recipe::distribution::DistributionSpec;
use crate::error::{Error, Result};
use crate::loader::parser::parse_json_file;

/// Statistical description of one task category.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecipe {
    pub runtime: DistributionSpec,
    /// Keyed by file extension; ordered so generation is reproducible under a fixed seed.
    pub input: BTreeMap<String, DistributionSpec>,
    pub output: BTreeMap<String, DistributionSpec>,
}

/// Per-category recipes. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recipe {
    tasks: HashMap<String, TaskRecipe>,
}

impl Recipe {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let dto: RecipeDto = parse_json_file(path)?;
        Recipe::try_from(dto)
    }

    pub fn task_recipe(&self, category: &str) -> Result<&TaskRecipe> {
        self.tasks
            .get(category)
            .ok_or_else(|| Error::ConfigurationError(format!("No recipe for task category '{}'", category)))
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }
}

fn convert_files(files: &BTreeMap<String, DistributionSpecDto>) -> Result<BTreeMap<String, DistributionSpec>> {
    files.iter().map(|(extension, spec)| Ok((extension.clone(), DistributionSpec::try_from(spec)?))).collect()
}

impl TryFrom<&TaskRecipeDto> for TaskRecipe {
    type Error = Error;

    fn try_from(dto: &TaskRecipeDto) -> Result<Self> {
        Ok(TaskRecipe {
            runtime: DistributionSpec::try_from(&dto.runtime)?,
            input: convert_files(&dto.input)?,
            output: convert_files(&dto.output)?,
        })
    }
}

impl TryFrom<RecipeDto> for Recipe {
    type Error = Error;

    fn try_from(dto: RecipeDto) -> Result<Self> {
        let mut tasks = HashMap::new();
        for (category, task_dto) in &dto.tasks {
            let task_recipe = TaskRecipe::try_from(task_dto)
                .map_err(|e| Error::ConfigurationError(format!("Recipe for category '{}': {}", category, e)))?;
            tasks.insert(category.clone(), task_recipe);
        }
        Ok(Recipe { tasks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_from_json() {
        let json = r#"{
            "mProject": {
                "runtime": { "min": 1.0, "max": 5.0, "distribution": { "name": "norm", "params": [0.5, 0.1] } },
                "input": { ".fits": { "min": 100, "max": 200 } },
                "output": { ".fits": { "min": 50, "max": 60 }, ".hdr": { "min": 1, "max": 1 } }
            }
        }"#;
        let dto: RecipeDto = serde_json::from_str(json).unwrap();
        let recipe = Recipe::try_from(dto).unwrap();

        let task_recipe = recipe.task_recipe("mProject").unwrap();
        assert_eq!(task_recipe.input.len(), 1);
        assert_eq!(task_recipe.output.keys().collect::<Vec<_>>(), vec![".fits", ".hdr"]);
        assert!(task_recipe.runtime.distribution.is_some());
    }

    #[test]
    fn test_missing_category_is_configuration_error() {
        let recipe = Recipe::default();
        assert!(matches!(recipe.task_recipe("mAdd"), Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_bad_distribution_names_category() {
        let json = r#"{ "mAdd": { "runtime": { "min": 1, "max": 2, "distribution": { "name": "zipf", "params": [] } } } }"#;
        let dto: RecipeDto = serde_json::from_str(json).unwrap();
        match Recipe::try_from(dto) {
            Err(Error::ConfigurationError(msg)) => assert!(msg.contains("mAdd")),
            other => panic!("expected configuration error, got {:?}", other),
        }
    }
}
