// THEORY:
// The `VegetationClassifier` turns one segmented photo into a single number: the
// percentage of the frame covered by greenery.
//
// It fuses two independent rules with a logical OR:
// 1.  **Strict rule**: the region is not too bright in any channel (red < 0.6,
//     green < 0.9, blue < 0.6) AND its excess green beats an adaptive threshold.
//     The threshold comes from Otsu's method on the excess-green array of this very
//     image, clamped into [0.05, 0.10] so that a grey street or a lawn-filled frame
//     cannot push it anywhere absurd.
// 2.  **Shadow rule**: the region is dark in every channel (< 0.3) AND its excess
//     green beats a fixed 0.05. This recovers foliage in shade, whose colour bias is
//     weak but still present.
//
// The green-over-red and positive-difference-product masks are computed and
// reported but take no part in the fused decision.
//
// The percentage divides by a configured image area, not by the size of the image
// actually passed in. A frame of a different size produces a misleading number
// unless `enforce_expected_area` turns the mismatch into an error.

use crate::core_modules::channel::Mask;
use crate::core_modules::color_image::ColorImage;
use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::threshold::{ThresholdSource, clamp_threshold, select_threshold_detailed};
use crate::error::{GreenViewError, Result};
use serde::{Deserialize, Serialize};

/// Default street-view frame is 400x400.
pub const DEFAULT_EXPECTED_PIXEL_COUNT: usize = 400 * 400;

/// The empirical colour limits and threshold policy of the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub plausible_red_max: f64,
    pub plausible_green_max: f64,
    pub plausible_blue_max: f64,
    pub shadow_red_max: f64,
    pub shadow_green_max: f64,
    pub shadow_blue_max: f64,
    /// Returned by the threshold selector for degenerate histograms.
    pub threshold_fallback: f64,
    pub threshold_floor: f64,
    pub threshold_ceiling: f64,
    /// Excess green a shadow pixel needs.
    pub shadow_excess_green_min: f64,
    /// Denominator of the percentage.
    pub expected_pixel_count: usize,
    /// Reject images whose area differs from `expected_pixel_count`.
    pub enforce_expected_area: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            plausible_red_max: 0.6,
            plausible_green_max: 0.9,
            plausible_blue_max: 0.6,
            shadow_red_max: 0.3,
            shadow_green_max: 0.3,
            shadow_blue_max: 0.3,
            threshold_fallback: 0.1,
            threshold_floor: 0.05,
            threshold_ceiling: 0.10,
            shadow_excess_green_min: 0.05,
            expected_pixel_count: DEFAULT_EXPECTED_PIXEL_COUNT,
            enforce_expected_area: false,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<()> {
        if self.expected_pixel_count == 0 {
            return Err(GreenViewError::Config("expected_pixel_count must be positive".into()));
        }
        let limits = [
            self.plausible_red_max,
            self.plausible_green_max,
            self.plausible_blue_max,
            self.shadow_red_max,
            self.shadow_green_max,
            self.shadow_blue_max,
            self.threshold_fallback,
            self.threshold_floor,
            self.threshold_ceiling,
            self.shadow_excess_green_min,
        ];
        if limits.iter().any(|v| !v.is_finite()) {
            return Err(GreenViewError::Config("classifier limits must be finite".into()));
        }
        if self.threshold_floor > self.threshold_ceiling {
            return Err(GreenViewError::Config(format!(
                "threshold_floor {} is above threshold_ceiling {}",
                self.threshold_floor, self.threshold_ceiling
            )));
        }
        Ok(())
    }
}

/// Pixel counts of the masks that are computed but not fused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuxiliaryCounts {
    /// `(g − r) × (g − b) > 0`
    pub positive_difference_product: usize,
    /// `g − r > 0`
    pub green_over_red: usize,
}

/// Everything the classifier decided about one image.
#[derive(Debug, Clone)]
pub struct VegetationReport {
    /// Vegetation pixels as a percentage of the configured image area.
    pub percentage: f64,
    pub vegetation_pixels: usize,
    /// The fused per-pixel decision.
    pub mask: Mask,
    /// Threshold selector output before clamping.
    pub raw_threshold: f64,
    pub threshold_source: ThresholdSource,
    /// Threshold actually applied to excess green.
    pub threshold: f64,
    /// Pixels passing the three "plausible vegetation" colour limits.
    pub plausible_pixels: usize,
    /// Pixels passing the three shadow limits.
    pub shadow_pixels: usize,
    pub auxiliary: AuxiliaryCounts,
}

/// Classifies segmented images as vegetation or not.
#[derive(Debug, Clone, Default)]
pub struct VegetationClassifier {
    config: ClassifierConfig,
}

impl VegetationClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Runs the fused vegetation rules on a segmented, normalized image.
    pub fn classify(&self, segmented: &ColorImage) -> Result<VegetationReport> {
        let config = &self.config;
        if config.enforce_expected_area && segmented.pixel_count() != config.expected_pixel_count {
            return Err(GreenViewError::DimensionMismatch {
                expected_pixels: config.expected_pixel_count,
                actual_pixels: segmented.pixel_count(),
            });
        }

        let (red, green, blue) = segmented.split_channels();
        let green_red_diff = green.zip_with(&red, |g, r| g - r)?;
        let green_blue_diff = green.zip_with(&blue, |g, b| g - b)?;
        let excess_green = green_red_diff.zip_with(&green_blue_diff, |a, b| a + b)?;
        let diff_product = green_red_diff.zip_with(&green_blue_diff, |a, b| a * b)?;

        let plausible = red
            .less_than(config.plausible_red_max)
            .and(&green.less_than(config.plausible_green_max))?
            .and(&blue.less_than(config.plausible_blue_max))?;
        let shadow = red
            .less_than(config.shadow_red_max)
            .and(&green.less_than(config.shadow_green_max))?
            .and(&blue.less_than(config.shadow_blue_max))?;

        let auxiliary = AuxiliaryCounts {
            positive_difference_product: diff_product.greater_than(0.0).count(),
            green_over_red: green_red_diff.greater_than(0.0).count(),
        };

        let selection = select_threshold_detailed(&excess_green, config.threshold_fallback)?;
        let threshold = clamp_threshold(selection.level, config.threshold_floor, config.threshold_ceiling);

        let excess_green_mask = excess_green.greater_than(threshold);
        let shadow_excess_green_mask = excess_green.greater_than(config.shadow_excess_green_min);

        let mask = plausible
            .and(&excess_green_mask)?
            .or(&shadow.and(&shadow_excess_green_mask)?)?;

        let vegetation_pixels = mask.count();
        let percentage = mask.percentage_of(config.expected_pixel_count);

        tracing::debug!(
            raw_threshold = selection.level,
            threshold,
            vegetation_pixels,
            percentage,
            "classified {}x{} image",
            segmented.width(),
            segmented.height()
        );

        Ok(VegetationReport {
            percentage,
            vegetation_pixels,
            mask,
            raw_threshold: selection.level,
            threshold_source: selection.source,
            threshold,
            plausible_pixels: plausible.count(),
            shadow_pixels: shadow.count(),
            auxiliary,
        })
    }

    /// Per-pixel form of the fused rule with a given excess-green threshold.
    pub fn is_vegetation(&self, pixel: &Pixel, threshold: f64) -> bool {
        let config = &self.config;
        let excess_green = pixel.excess_green();
        let plausible = pixel.red < config.plausible_red_max
            && pixel.green < config.plausible_green_max
            && pixel.blue < config.plausible_blue_max;
        let shadow = pixel.red < config.shadow_red_max
            && pixel.green < config.shadow_green_max
            && pixel.blue < config.shadow_blue_max;
        (plausible && excess_green > threshold) || (shadow && excess_green > config.shadow_excess_green_min)
    }
}

/// Vegetation percentage of a segmented image under the default configuration.
pub fn classify_vegetation(segmented: &ColorImage) -> Result<f64> {
    VegetationClassifier::default()
        .classify(segmented)
        .map(|report| report.percentage)
}
