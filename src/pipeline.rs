// THEORY:
// The `pipeline` module is the top-level API of the classification engine. It wires
// the two stages together, segmentation then vegetation classification, behind one
// call per image, and averages those calls into a Green View Index per sample point.
//
// A `GreenViewPipeline` holds no per-image state. It can be cloned freely and shared
// between worker threads; every call works on its own arrays.

use crate::core_modules::chunk::chunk::ChunkSegmenter;
use crate::core_modules::color_image::ColorImage;
use crate::core_modules::mean_shift::MeanShiftSegmenter;
use crate::core_modules::segmenter::{Segmentation, SegmentationParams, Segmenter, segment_checked};
use crate::core_modules::vegetation::{ClassifierConfig, VegetationClassifier};
use crate::error::{GreenViewError, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// Re-export key data structures for the public API.
pub use crate::core_modules::vegetation::VegetationReport;

/// Which segmentation algorithm feeds the classifier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmenterKind {
    #[default]
    MeanShift,
    /// Fixed rectangular blocks of `width` x `height` pixels.
    Chunk { width: usize, height: usize },
}

/// Configuration for the GreenViewPipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub segmenter: SegmenterKind,
    pub segmentation: SegmentationParams,
    pub classifier: ClassifierConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.segmentation.validate()?;
        self.classifier.validate()?;
        if let SegmenterKind::Chunk { width, height } = self.segmenter {
            if width == 0 || height == 0 {
                return Err(GreenViewError::Config(format!(
                    "chunk segmenter needs a positive size, got {}x{}",
                    width, height
                )));
            }
        }
        Ok(())
    }
}

/// The result of running one image through the pipeline.
#[derive(Debug, Clone)]
pub struct ImageAnalysis {
    pub segmentation: Segmentation,
    pub vegetation: VegetationReport,
}

impl ImageAnalysis {
    pub fn percentage(&self) -> f64 {
        self.vegetation.percentage
    }
}

/// The main, top-level struct for the classification engine.
#[derive(Clone)]
pub struct GreenViewPipeline {
    segmenter: Arc<dyn Segmenter>,
    classifier: VegetationClassifier,
}

impl GreenViewPipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        let segmenter: Arc<dyn Segmenter> = match config.segmenter {
            SegmenterKind::MeanShift => Arc::new(MeanShiftSegmenter::new(config.segmentation.clone())?),
            SegmenterKind::Chunk { width, height } => Arc::new(ChunkSegmenter::new(width, height)?),
        };
        Ok(Self {
            segmenter,
            classifier: VegetationClassifier::new(config.classifier.clone())?,
        })
    }

    /// Builds a pipeline around any segmenter that honours the segmenter contract.
    pub fn with_segmenter(segmenter: Arc<dyn Segmenter>, classifier: VegetationClassifier) -> Self {
        Self { segmenter, classifier }
    }

    pub fn segmenter_name(&self) -> &'static str {
        self.segmenter.name()
    }

    pub fn classifier(&self) -> &VegetationClassifier {
        &self.classifier
    }

    /// Segments an image and classifies the segmented result.
    pub fn analyze(&self, image: &ColorImage) -> Result<ImageAnalysis> {
        // Stage 1: Region Segmentation
        let segmentation = segment_checked(self.segmenter.as_ref(), image)?;

        // Stage 2: Vegetation Classification
        let vegetation = self.classifier.classify(&segmentation.segmented)?;

        Ok(ImageAnalysis {
            segmentation,
            vegetation,
        })
    }

    pub fn analyze_rgb(&self, image: &RgbImage) -> Result<ImageAnalysis> {
        self.analyze(&ColorImage::from_rgb_image(image)?)
    }

    /// Vegetation percentage of a raw 8-bit image.
    pub fn vegetation_percentage(&self, image: &RgbImage) -> Result<f64> {
        self.analyze_rgb(image).map(|analysis| analysis.percentage())
    }

    /// Green View Index: the mean vegetation percentage over directional images
    /// of one sample point. Any failing image fails the whole point.
    pub fn green_view_index(&self, images: &[RgbImage]) -> Result<f64> {
        if images.is_empty() {
            return Err(GreenViewError::InvalidInput(
                "a sample point needs at least one image".into(),
            ));
        }
        let mut total = 0.0;
        for image in images {
            total += self.vegetation_percentage(image)?;
        }
        Ok(total / images.len() as f64)
    }
}

impl Default for GreenViewPipeline {
    fn default() -> Self {
        Self {
            segmenter: Arc::new(MeanShiftSegmenter::default()),
            classifier: VegetationClassifier::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;

    fn chunk_config(pixels: usize) -> PipelineConfig {
        PipelineConfig {
            segmenter: SegmenterKind::Chunk { width: 4, height: 4 },
            classifier: ClassifierConfig {
                expected_pixel_count: pixels,
                ..ClassifierConfig::default()
            },
            ..PipelineConfig::default()
        }
    }

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, image::Rgb(rgb))
    }

    #[test]
    fn analyze_green_and_white_images() {
        let pipeline = GreenViewPipeline::new(&chunk_config(64)).unwrap();
        assert_eq!(pipeline.segmenter_name(), "chunk");
        assert_eq!(pipeline.vegetation_percentage(&solid(8, 8, [25, 204, 25])).unwrap(), 100.0);
        assert_eq!(pipeline.vegetation_percentage(&solid(8, 8, [230, 230, 230])).unwrap(), 0.0);
    }

    #[test]
    fn green_view_index_averages_headings() {
        let pipeline = GreenViewPipeline::new(&chunk_config(64)).unwrap();
        let images = vec![
            solid(8, 8, [25, 204, 25]),
            solid(8, 8, [230, 230, 230]),
            solid(8, 8, [230, 230, 230]),
            solid(8, 8, [25, 204, 25]),
        ];
        assert_eq!(pipeline.green_view_index(&images).unwrap(), 50.0);
        assert!(pipeline.green_view_index(&[]).is_err());
    }

    #[test]
    fn analysis_is_idempotent() {
        let pipeline = GreenViewPipeline::new(&PipelineConfig {
            segmentation: SegmentationParams {
                spatial_radius: 2,
                range_radius: 7.0,
                min_density: 4,
            },
            classifier: ClassifierConfig {
                expected_pixel_count: 100,
                ..ClassifierConfig::default()
            },
            ..PipelineConfig::default()
        })
        .unwrap();
        let image = ColorImage::from_fn(10, 10, |x, y| {
            if x + y < 10 { Pixel::new(0.15, 0.55, 0.1) } else { Pixel::new(0.6, 0.6, 0.65) }
        })
        .unwrap();
        let first = pipeline.analyze(&image).unwrap();
        let second = pipeline.analyze(&image).unwrap();
        assert_eq!(first.percentage(), second.percentage());
        assert_eq!(first.vegetation.mask, second.vegetation.mask);
        assert_eq!(first.segmentation.labels, second.segmentation.labels);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = PipelineConfig {
            segmenter: SegmenterKind::Chunk { width: 0, height: 4 },
            ..PipelineConfig::default()
        };
        assert!(GreenViewPipeline::new(&config).is_err());
    }
}
