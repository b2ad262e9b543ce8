use std::collections::HashMap;
use std::fmt::Display;
use std::path::PathBuf;

use crate::api::params_dto::{BenchmarkParamsDto, ParamValueDto};
use crate::error::{Error, Result};

pub const DEFAULT_PERCENT_CPU: f64 = 0.6;

/// One value for all tasks or one value per category.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue<T> {
    Scalar(T),
    PerCategory(HashMap<String, T>),
}

impl<T: Copy> ParamValue<T> {
    pub fn resolve(&self, category: &str, param: &str) -> Result<T> {
        match self {
            ParamValue::Scalar(value) => Ok(*value),
            ParamValue::PerCategory(values) => values.get(category).copied().ok_or_else(|| {
                Error::ConfigurationError(format!("Unknown category '{}' in '{}' mapping", category, param))
            }),
        }
    }
}

impl<T> From<ParamValueDto<T>> for ParamValue<T> {
    fn from(dto: ParamValueDto<T>) -> Self {
        match dto {
            ParamValueDto::Scalar(value) => ParamValue::Scalar(value),
            ParamValueDto::PerCategory(values) => ParamValue::PerCategory(values.into_iter().collect()),
        }
    }
}

/// How much data the benchmark moves.
#[derive(Debug, Clone, PartialEq)]
pub enum DataFootprint {
    /// Total footprint in megabytes, spread evenly over every file.
    TotalMegabytes(u64),
    /// Bytes a task of the given category ingests.
    PerCategory(HashMap<String, u64>),
}

impl From<ParamValueDto<u64>> for DataFootprint {
    fn from(dto: ParamValueDto<u64>) -> Self {
        match dto {
            ParamValueDto::Scalar(megabytes) => DataFootprint::TotalMegabytes(megabytes),
            ParamValueDto::PerCategory(sizes) => DataFootprint::PerCategory(sizes.into_iter().collect()),
        }
    }
}

/// Everything that turns a task graph into a runnable benchmark.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkParams {
    pub percent_cpu: ParamValue<f64>,
    pub cpu_work: Option<ParamValue<u64>>,
    pub gpu_work: Option<ParamValue<u64>>,
    pub data: Option<DataFootprint>,
    pub lock_files_dir: Option<PathBuf>,
}

impl Default for BenchmarkParams {
    fn default() -> Self {
        BenchmarkParams {
            percent_cpu: ParamValue::Scalar(DEFAULT_PERCENT_CPU),
            cpu_work: None,
            gpu_work: None,
            data: None,
            lock_files_dir: None,
        }
    }
}

impl BenchmarkParams {
    pub fn with_lock_files_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_files_dir = Some(dir.into());
        self
    }
}

fn check_percent(value: f64, context: impl Display) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::ConfigurationError(format!("percent_cpu must be within [0, 1], got {} for {}", value, context)))
    }
}

impl TryFrom<BenchmarkParamsDto> for BenchmarkParams {
    type Error = Error;

    fn try_from(dto: BenchmarkParamsDto) -> Result<Self> {
        let percent_cpu: ParamValue<f64> =
            dto.percent_cpu.map(Into::into).unwrap_or(ParamValue::Scalar(DEFAULT_PERCENT_CPU));

        match &percent_cpu {
            ParamValue::Scalar(value) => check_percent(*value, "all tasks")?,
            ParamValue::PerCategory(values) => {
                for (category, value) in values {
                    check_percent(*value, format!("category '{}'", category))?;
                }
            }
        }

        Ok(BenchmarkParams {
            percent_cpu,
            cpu_work: dto.cpu_work.map(Into::into),
            gpu_work: dto.gpu_work.map(Into::into),
            data: dto.data.map(Into::into),
            lock_files_dir: None,
        })
    }
}
