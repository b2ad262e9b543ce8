use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A recipe document: one entry per task category.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(transparent)]
pub struct RecipeDto {
    pub tasks: BTreeMap<String, TaskRecipeDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TaskRecipeDto {
    pub runtime: DistributionSpecDto,

    /// Keyed by file extension (e.g. ".fits").
    #[serde(default)]
    pub input: BTreeMap<String, DistributionSpecDto>,

    #[serde(default)]
    pub output: BTreeMap<String, DistributionSpecDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DistributionSpecDto {
    /// Absent or `null` means uniform over `[min, max]`.
    #[serde(default)]
    pub distribution: Option<DistributionDto>,
    pub min: f64,
    pub max: f64,
}

/// A fitted distribution in scipy naming: `params` is `[shape..., loc, scale]`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DistributionDto {
    pub name: String,
    #[serde(default)]
    pub params: Vec<f64>,
}
