//! File configuration for the survey binary and library entry points.

use crate::error::{GreenViewError, Result};
use crate::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_HEADING_COUNT: usize = 6;

fn default_green_months() -> Vec<String> {
    ["05", "06", "07", "08", "09"].iter().map(|m| m.to_string()).collect()
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

/// Settings of the directory-level survey driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Directory holding cached heading images.
    pub image_root: PathBuf,
    /// Capture months (two digits) treated as green season.
    pub green_months: Vec<String>,
    pub heading_count: usize,
    pub worker_count: usize,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            image_root: PathBuf::from("images"),
            green_months: default_green_months(),
            heading_count: DEFAULT_HEADING_COUNT,
            worker_count: default_worker_count(),
        }
    }
}

impl SurveyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.heading_count == 0 {
            return Err(GreenViewError::Config("heading_count must be positive".into()));
        }
        if self.worker_count == 0 {
            return Err(GreenViewError::Config("worker_count must be positive".into()));
        }
        if let Some(month) = self.green_months.iter().find(|m| m.len() != 2) {
            return Err(GreenViewError::Config(format!(
                "green month {:?} is not a two-digit month",
                month
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GreenViewConfig {
    pub pipeline: PipelineConfig,
    pub survey: SurveyConfig,
}

impl GreenViewConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        self.survey.validate()
    }
}
