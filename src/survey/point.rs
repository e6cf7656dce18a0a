//! Green View Index of one sample point.

use crate::pipeline::GreenViewPipeline;
use crate::survey::image_source::ImageSource;
use crate::survey::metadata::PanoramaRecord;
use crate::survey::record::GreenViewRecord;
use tracing::{info, warn};

/// Accumulated value that replaces a point's sum when any heading fails.
pub const FAILURE_SENTINEL: f64 = -1000.0;

/// `count` evenly spaced horizontal headings in degrees, starting at 0.
pub fn headings(count: usize) -> Vec<f64> {
    let step = 360.0 / count as f64;
    (0..count).map(|i| step * i as f64).collect()
}

/// Fetches and classifies every heading image of a panorama. The first
/// failure stops the point; its value becomes `FAILURE_SENTINEL / headings`.
pub fn measure_point(
    pipeline: &GreenViewPipeline,
    source: &dyn ImageSource,
    panorama: PanoramaRecord,
    headings: &[f64],
) -> GreenViewRecord {
    let mut total = 0.0;
    let mut failed = false;

    for &heading in headings {
        let percentage = source
            .fetch(&panorama.pano_id, heading)
            .and_then(|image| pipeline.vegetation_percentage(&image));
        match percentage {
            Ok(value) => total += value,
            Err(e) => {
                warn!(pano_id = %panorama.pano_id, heading, error = %e, "heading failed");
                total = FAILURE_SENTINEL;
                failed = true;
                break;
            }
        }
    }

    let green_view = total / headings.len() as f64;
    info!(
        pano_id = %panorama.pano_id,
        longitude = %panorama.longitude,
        latitude = %panorama.latitude,
        green_view,
        "measured point"
    );

    GreenViewRecord {
        panorama,
        green_view,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::vegetation::ClassifierConfig;
    use crate::error::{GreenViewError, Result};
    use crate::pipeline::{PipelineConfig, SegmenterKind};
    use image::RgbImage;

    /// Green at headings below 180 degrees, grey elsewhere; fails at `broken`.
    struct HalfGreen {
        broken: Option<f64>,
    }

    impl ImageSource for HalfGreen {
        fn fetch(&self, pano_id: &str, heading: f64) -> Result<RgbImage> {
            if self.broken == Some(heading) {
                return Err(GreenViewError::ImageUnavailable {
                    pano_id: pano_id.into(),
                    heading,
                    reason: "offline".into(),
                });
            }
            let rgb = if heading < 180.0 { [25, 204, 25] } else { [200, 200, 200] };
            Ok(RgbImage::from_pixel(8, 8, image::Rgb(rgb)))
        }
    }

    fn pipeline() -> GreenViewPipeline {
        GreenViewPipeline::new(&PipelineConfig {
            segmenter: SegmenterKind::Chunk { width: 4, height: 4 },
            classifier: ClassifierConfig {
                expected_pixel_count: 64,
                ..ClassifierConfig::default()
            },
            ..PipelineConfig::default()
        })
        .unwrap()
    }

    fn panorama() -> PanoramaRecord {
        PanoramaRecord {
            pano_id: "p1".into(),
            pano_date: "2014-07".into(),
            longitude: "-71.09".into(),
            latitude: "42.35".into(),
        }
    }

    #[test]
    fn six_headings_by_default_spacing() {
        assert_eq!(headings(6), vec![0.0, 60.0, 120.0, 180.0, 240.0, 300.0]);
        assert_eq!(headings(4), vec![0.0, 90.0, 180.0, 270.0]);
    }

    #[test]
    fn averages_heading_percentages() {
        let record = measure_point(&pipeline(), &HalfGreen { broken: None }, panorama(), &headings(6));
        assert!(!record.failed);
        assert_eq!(record.green_view, 50.0);
    }

    #[test]
    fn failed_heading_writes_sentinel() {
        let record = measure_point(
            &pipeline(),
            &HalfGreen { broken: Some(240.0) },
            panorama(),
            &headings(6),
        );
        assert!(record.failed);
        assert_eq!(record.green_view, -1000.0 / 6.0);
    }
}
