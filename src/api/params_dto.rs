use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Either one value for every task or one value per task category.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ParamValueDto<T> {
    Scalar(T),
    PerCategory(BTreeMap<String, T>),
}

/// The benchmark parameter file: `{percent_cpu, cpu_work, gpu_work, data}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BenchmarkParamsDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_cpu: Option<ParamValueDto<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_work: Option<ParamValueDto<u64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_work: Option<ParamValueDto<u64>>,

    /// Total footprint in MB, or bytes per task category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ParamValueDto<u64>>,
}
