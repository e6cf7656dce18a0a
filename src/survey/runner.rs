//! Directory-level survey: every metadata file in, one result file out.

use crate::config::GreenViewConfig;
use crate::error::{GreenViewError, Result};
use crate::parallel_pipeline::ParallelPipeline;
use crate::pipeline::GreenViewPipeline;
use crate::survey::image_source::{DirectoryImageSource, ImageSource};
use crate::survey::metadata::read_metadata_file;
use crate::survey::record::{result_file_name, write_records};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const METADATA_EXTENSION: &str = "txt";

#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Written {
        output: PathBuf,
        points: usize,
        failed_points: usize,
    },
    /// The result file already existed, possibly claimed by another process.
    Skipped { output: PathBuf },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveySummary {
    pub files_written: usize,
    pub files_skipped: usize,
    pub points: usize,
    pub failed_points: usize,
}

impl SurveySummary {
    fn add(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Written {
                points,
                failed_points,
                ..
            } => {
                self.files_written += 1;
                self.points += points;
                self.failed_points += failed_points;
            }
            FileOutcome::Skipped { .. } => self.files_skipped += 1,
        }
    }
}

pub struct SurveyRunner {
    parallel: ParallelPipeline,
    green_months: Vec<String>,
}

impl SurveyRunner {
    /// Must be called from within a tokio runtime.
    pub fn new(config: &GreenViewConfig, source: Arc<dyn ImageSource>) -> Result<Self> {
        config.validate()?;
        let pipeline = GreenViewPipeline::new(&config.pipeline)?;
        let parallel = ParallelPipeline::new(
            pipeline,
            source,
            config.survey.heading_count,
            config.survey.worker_count,
        )?;
        Ok(Self {
            parallel,
            green_months: config.survey.green_months.clone(),
        })
    }

    /// Reads heading images from the configured image root.
    pub fn from_config(config: &GreenViewConfig) -> Result<Self> {
        let source = DirectoryImageSource::new(&config.survey.image_root);
        Self::new(config, Arc::new(source))
    }

    pub async fn run_file(&self, metadata_path: &Path, output_dir: &Path) -> Result<FileOutcome> {
        let file_name = metadata_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                GreenViewError::Metadata(format!("{} has no usable file name", metadata_path.display()))
            })?;
        let output = output_dir.join(result_file_name(file_name));

        // Claim the output atomically so processes sharing a directory split the work.
        match std::fs::OpenOptions::new().write(true).create_new(true).open(&output) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                info!(output = %output.display(), "result file already exists");
                return Ok(FileOutcome::Skipped { output });
            }
            Err(e) => return Err(e.into()),
        }

        let processed = self.measure_file(metadata_path, &output).await;
        if processed.is_err() {
            // Release the claim so a later run can retry.
            let _ = std::fs::remove_file(&output);
        }
        let (points, failed_points) = processed?;

        info!(output = %output.display(), points, failed_points, "wrote results");
        Ok(FileOutcome::Written {
            output,
            points,
            failed_points,
        })
    }

    async fn measure_file(&self, metadata_path: &Path, output: &Path) -> Result<(usize, usize)> {
        let panoramas = read_metadata_file(metadata_path, &self.green_months)?;
        info!(file = %metadata_path.display(), points = panoramas.len(), "measuring points");
        let records = self.parallel.process_points(panoramas).await?;
        write_records(output, &records)?;
        let failed = records.iter().filter(|r| r.failed).count();
        Ok((records.len(), failed))
    }

    /// Processes every `*.txt` metadata file in `metadata_dir`, in name order.
    pub async fn run_directory(&self, metadata_dir: &Path, output_dir: &Path) -> Result<SurveySummary> {
        std::fs::create_dir_all(output_dir)?;
        let mut inputs = Vec::new();
        for entry in std::fs::read_dir(metadata_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == METADATA_EXTENSION) {
                inputs.push(path);
            }
        }
        inputs.sort();

        let mut summary = SurveySummary::default();
        for input in inputs {
            let outcome = self.run_file(&input, output_dir).await?;
            summary.add(&outcome);
        }
        Ok(summary)
    }

    pub async fn shutdown(self) {
        self.parallel.shutdown().await;
    }
}
