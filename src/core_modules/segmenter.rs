// THEORY:
// Segmentation is the bridge between raw, noisy pixels and the region-level colour
// rules of the classifier. The classifier never looks at raw pixels: it assumes that
// every pixel already carries the average colour of the region it belongs to.
//
// The `Segmenter` trait is that assumption written down. Any algorithm may sit
// behind it (mean shift, fixed blocks, superpixels) as long as its output keeps the
// contract checked by `Segmentation::validate_against`:
// 1.  **Same shape**: the segmented image has the input's dimensions.
// 2.  **Full coverage**: one label per pixel, every label below the region count,
//     and no empty regions.
// 3.  **Contiguity**: each region is one 4-connected component.
// 4.  **Region colour**: all pixels of a region share one colour.
//
// A violation is a hard failure. There is nothing sensible the classifier can do
// with a broken segmentation, so it is never repaired downstream.

use crate::core_modules::color_image::ColorImage;
use crate::core_modules::pixel::pixel::Pixel;
use crate::error::{GreenViewError, Result};
use serde::{Deserialize, Serialize};

/// Granularity knobs shared by every segmenter. Fixed per run, not per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationParams {
    /// Spatial bandwidth in pixels.
    pub spatial_radius: u32,
    /// Colour bandwidth in L*u*v* units.
    pub range_radius: f64,
    /// Regions with fewer pixels are merged into a neighbour.
    pub min_density: usize,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            spatial_radius: 6,
            range_radius: 7.0,
            min_density: 40,
        }
    }
}

impl SegmentationParams {
    pub fn validate(&self) -> Result<()> {
        if self.spatial_radius == 0 {
            return Err(GreenViewError::Config("spatial_radius must be positive".into()));
        }
        if !(self.range_radius.is_finite() && self.range_radius > 0.0) {
            return Err(GreenViewError::Config(format!(
                "range_radius must be a positive number, got {}",
                self.range_radius
            )));
        }
        Ok(())
    }
}

/// The output of a segmenter for one image.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// The input image with every pixel replaced by its region's mean colour.
    pub segmented: ColorImage,
    /// Row-major region label of every pixel.
    pub labels: Vec<u32>,
    pub region_count: usize,
}

impl Segmentation {
    /// Checks the segmenter contract against the image that was segmented.
    pub fn validate_against(&self, input: &ColorImage) -> Result<()> {
        let (width, height) = input.shape();
        if self.segmented.shape() != input.shape() {
            return Err(GreenViewError::SegmenterContract(format!(
                "segmented image is {:?}, input is {:?}",
                self.segmented.shape(),
                input.shape()
            )));
        }
        if self.labels.len() != width * height {
            return Err(GreenViewError::SegmenterContract(format!(
                "label map covers {} of {} pixels",
                self.labels.len(),
                width * height
            )));
        }
        if self.region_count == 0 {
            return Err(GreenViewError::SegmenterContract("no regions reported".into()));
        }
        if let Some(label) = self.labels.iter().find(|&&l| l as usize >= self.region_count) {
            return Err(GreenViewError::SegmenterContract(format!(
                "label {} outside the {} reported regions",
                label, self.region_count
            )));
        }

        let mut region_colors: Vec<Option<Pixel>> = vec![None; self.region_count];
        for (label, pixel) in self.labels.iter().zip(self.segmented.pixels()) {
            let index = *label as usize;
            match region_colors[index] {
                None => region_colors[index] = Some(*pixel),
                Some(color) if color != *pixel => {
                    return Err(GreenViewError::SegmenterContract(format!(
                        "region {} is not painted with a single colour",
                        label
                    )));
                }
                Some(_) => {}
            }
        }
        if let Some(empty) = region_colors.iter().position(Option::is_none) {
            return Err(GreenViewError::SegmenterContract(format!("region {} has no pixels", empty)));
        }

        let components = count_components(&self.labels, width, height);
        if components != self.region_count {
            return Err(GreenViewError::SegmenterContract(format!(
                "{} regions reported but the label map has {} connected components",
                self.region_count, components
            )));
        }
        Ok(())
    }
}

/// A region segmentation algorithm.
pub trait Segmenter: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn segment(&self, image: &ColorImage) -> Result<Segmentation>;
}

/// Runs a segmenter and refuses any output that breaks the contract.
pub fn segment_checked(segmenter: &dyn Segmenter, image: &ColorImage) -> Result<Segmentation> {
    let segmentation = segmenter.segment(image)?;
    segmentation.validate_against(image)?;
    tracing::debug!(
        segmenter = segmenter.name(),
        regions = segmentation.region_count,
        "segmented {}x{} image",
        image.width(),
        image.height()
    );
    Ok(segmentation)
}

/// Paints every pixel with the mean input colour of its region.
pub fn paint_region_means(image: &ColorImage, labels: &[u32], region_count: usize) -> Result<ColorImage> {
    if labels.len() != image.pixel_count() {
        return Err(GreenViewError::SegmenterContract(format!(
            "label map covers {} of {} pixels",
            labels.len(),
            image.pixel_count()
        )));
    }
    let mut sums = vec![[0.0f64; 3]; region_count];
    let mut counts = vec![0usize; region_count];
    for (&label, pixel) in labels.iter().zip(image.pixels()) {
        let index = label as usize;
        if index >= region_count {
            return Err(GreenViewError::SegmenterContract(format!(
                "label {} outside the {} regions",
                label, region_count
            )));
        }
        for (sum, channel) in sums[index].iter_mut().zip(pixel.channels()) {
            *sum += channel;
        }
        counts[index] += 1;
    }

    let means: Vec<Pixel> = sums
        .iter()
        .zip(&counts)
        .map(|(sum, &count)| {
            if count == 0 {
                return Pixel::default();
            }
            let n = count as f64;
            // Averages of [0, 1] values can drift past 1.0 by an ulp.
            Pixel::new(
                (sum[0] / n).clamp(0.0, 1.0),
                (sum[1] / n).clamp(0.0, 1.0),
                (sum[2] / n).clamp(0.0, 1.0),
            )
        })
        .collect();

    let pixels = labels.iter().map(|&label| means[label as usize]).collect();
    ColorImage::from_pixels(image.width(), image.height(), pixels)
}

/// Renumbers labels to 0..k in first-seen order and returns k.
pub fn compact_labels(labels: &mut [u32]) -> usize {
    let mut remap = std::collections::HashMap::new();
    for label in labels.iter_mut() {
        let next = remap.len() as u32;
        *label = *remap.entry(*label).or_insert(next);
    }
    remap.len()
}

/// Number of 4-connected same-label components.
fn count_components(labels: &[u32], width: usize, height: usize) -> usize {
    let mut visited = vec![false; labels.len()];
    let mut components = 0;
    let mut queue = Vec::new();

    for start in 0..labels.len() {
        if visited[start] {
            continue;
        }
        components += 1;
        visited[start] = true;
        queue.push(start);
        while let Some(current) = queue.pop() {
            let (x, y) = (current % width, current / width);
            for (nx, ny) in four_neighbors(x, y, width, height) {
                let neighbor = ny * width + nx;
                if !visited[neighbor] && labels[neighbor] == labels[current] {
                    visited[neighbor] = true;
                    queue.push(neighbor);
                }
            }
        }
    }
    components
}

/// In-bounds 4-neighbours of `(x, y)`.
pub(crate) fn four_neighbors(x: usize, y: usize, width: usize, height: usize) -> impl Iterator<Item = (usize, usize)> {
    [(0i64, 1i64), (0, -1), (1, 0), (-1, 0)].into_iter().filter_map(move |(dx, dy)| {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        (nx >= 0 && ny >= 0 && (nx as usize) < width && (ny as usize) < height).then(|| (nx as usize, ny as usize))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone() -> ColorImage {
        ColorImage::from_fn(4, 2, |x, _| {
            if x < 2 {
                Pixel::new(0.2, 0.6, 0.2)
            } else {
                Pixel::new(0.8, 0.8, 0.8)
            }
        })
        .unwrap()
    }

    fn halves() -> Vec<u32> {
        vec![0, 0, 1, 1, 0, 0, 1, 1]
    }

    #[test]
    fn region_means_and_valid_contract() {
        let image = two_tone();
        let segmented = paint_region_means(&image, &halves(), 2).unwrap();
        let segmentation = Segmentation {
            segmented,
            labels: halves(),
            region_count: 2,
        };
        assert!(segmentation.validate_against(&image).is_ok());
    }

    #[test]
    fn rejects_label_out_of_range() {
        let image = two_tone();
        let segmentation = Segmentation {
            segmented: image.clone(),
            labels: vec![0, 0, 2, 2, 0, 0, 2, 2],
            region_count: 2,
        };
        assert!(matches!(
            segmentation.validate_against(&image),
            Err(GreenViewError::SegmenterContract(_))
        ));
    }

    #[test]
    fn rejects_short_label_map_and_wrong_shape() {
        let image = two_tone();
        let short = Segmentation {
            segmented: image.clone(),
            labels: vec![0; 7],
            region_count: 1,
        };
        assert!(short.validate_against(&image).is_err());

        let other = ColorImage::filled(2, 4, Pixel::default()).unwrap();
        let wrong_shape = Segmentation {
            segmented: other,
            labels: vec![0; 8],
            region_count: 1,
        };
        assert!(wrong_shape.validate_against(&image).is_err());
    }

    #[test]
    fn rejects_split_region() {
        let labels = vec![0, 1, 0, 1, 0, 1, 0, 1];
        let image = ColorImage::filled(4, 2, Pixel::new(0.5, 0.5, 0.5)).unwrap();
        let segmentation = Segmentation {
            segmented: image.clone(),
            labels,
            region_count: 2,
        };
        assert!(segmentation.validate_against(&image).is_err());
    }

    #[test]
    fn rejects_unpainted_region() {
        let image = two_tone();
        let segmentation = Segmentation {
            segmented: image.clone(),
            labels: vec![0; 8],
            region_count: 1,
        };
        assert!(segmentation.validate_against(&image).is_err());
    }

    #[test]
    fn compact_labels_renumbers_in_order() {
        let mut labels = vec![7, 7, 3, 9, 3];
        assert_eq!(compact_labels(&mut labels), 3);
        assert_eq!(labels, vec![0, 0, 1, 2, 1]);
    }

    #[test]
    fn default_params() {
        let params = SegmentationParams::default();
        assert_eq!(params.spatial_radius, 6);
        assert_eq!(params.range_radius, 7.0);
        assert_eq!(params.min_density, 40);
        assert!(params.validate().is_ok());
    }
}
