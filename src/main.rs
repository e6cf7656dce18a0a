// Green View command line: survey panorama metadata or classify single images.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use green_view::core_modules::utils::image_helper::image_helper::{save_color_image, save_mask};
use green_view::survey::SurveyRunner;
use green_view::{GreenViewConfig, GreenViewPipeline};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "green_view")]
#[command(about = "Green View Index of street-level imagery", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the Green View Index of every panorama in a metadata directory
    Survey {
        /// Directory of panorama metadata `.txt` files
        metadata_dir: PathBuf,

        /// Directory receiving `GV_<file>` results
        output_dir: PathBuf,

        /// Configuration file path
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Directory of cached heading images
        #[arg(long)]
        image_root: Option<PathBuf>,

        /// Number of worker tasks
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Print the vegetation percentage of individual images
    Classify {
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Configuration file path
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Write the segmented image and vegetation mask here
        #[arg(long)]
        debug_dir: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<GreenViewConfig> {
    match path {
        Some(path) => GreenViewConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(GreenViewConfig::default()),
    }
}

async fn survey(
    metadata_dir: &Path,
    output_dir: &Path,
    mut config: GreenViewConfig,
    image_root: Option<PathBuf>,
    workers: Option<usize>,
) -> Result<()> {
    if let Some(image_root) = image_root {
        config.survey.image_root = image_root;
    }
    if let Some(workers) = workers {
        config.survey.worker_count = workers;
    }

    let runner = SurveyRunner::from_config(&config).context("starting survey")?;
    let summary = runner.run_directory(metadata_dir, output_dir).await;
    runner.shutdown().await;
    let summary = summary.with_context(|| format!("surveying {}", metadata_dir.display()))?;

    info!(
        files_written = summary.files_written,
        files_skipped = summary.files_skipped,
        points = summary.points,
        failed_points = summary.failed_points,
        "survey finished"
    );
    Ok(())
}

fn classify(images: &[PathBuf], config: &GreenViewConfig, debug_dir: Option<&Path>) -> Result<()> {
    let pipeline = GreenViewPipeline::new(&config.pipeline)?;
    if let Some(dir) = debug_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    for path in images {
        let image = image::open(path)
            .with_context(|| format!("reading {}", path.display()))?
            .to_rgb8();
        let analysis = pipeline
            .analyze_rgb(&image)
            .with_context(|| format!("classifying {}", path.display()))?;
        println!("{}: {:.4}", path.display(), analysis.percentage());

        if let Some(dir) = debug_dir {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
            save_color_image(&dir.join(format!("{}_segmented.png", stem)), &analysis.segmentation.segmented)?;
            save_mask(&dir.join(format!("{}_mask.png", stem)), &analysis.vegetation.mask)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Survey {
            metadata_dir,
            output_dir,
            config,
            image_root,
            workers,
        } => {
            let config = load_config(config.as_deref())?;
            survey(&metadata_dir, &output_dir, config, image_root, workers).await
        }
        Commands::Classify {
            images,
            config,
            debug_dir,
        } => {
            let config = load_config(config.as_deref())?;
            classify(&images, &config, debug_dir.as_deref())
        }
    }
}
