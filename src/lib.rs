// THEORY:
// This file is the entry point for the `green_view` library crate. It exposes the
// Green View Index engine: street-level images are first segmented into
// homogeneous colour regions, each region is repainted with its mean colour, and
// the repainted image is classified pixel by pixel as vegetation or not.
//
// The high-level interface is `GreenViewPipeline` (one image or one sample point)
// and `ParallelPipeline` (many sample points at once). The `survey` module reads
// panorama metadata and writes result records around them. The building blocks in
// `core_modules` stay public so callers can run the threshold selector or the
// classifier on their own.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;
pub mod survey;

pub use config::{GreenViewConfig, SurveyConfig};
pub use core_modules::color_image::ColorImage;
pub use core_modules::segmenter::{Segmentation, SegmentationParams, Segmenter};
pub use core_modules::threshold::select_threshold;
pub use core_modules::vegetation::{ClassifierConfig, VegetationClassifier, VegetationReport, classify_vegetation};
pub use error::{GreenViewError, Result};
pub use parallel_pipeline::ParallelPipeline;
pub use pipeline::{GreenViewPipeline, ImageAnalysis, PipelineConfig, SegmenterKind};
