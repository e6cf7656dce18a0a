// THEORY:
// `MeanShiftSegmenter` is the object-based half of the classifier: it turns a photo
// into flat patches of colour so that the vegetation rules judge leaves, lawns and
// facades instead of individual noisy pixels.
//
// Algorithm steps:
// 1.  **Feature Space**: Each pixel becomes a joint (x, y, L*, u*, v*) point. The
//     spatial radius bounds the window in pixels, the range radius bounds colour
//     distance in L*u*v* units.
// 2.  **Filtering**: Every pixel climbs to the local density mode of its window with
//     a flat kernel. Converged colours (modes) replace the raw colours.
// 3.  **Region Fusion**: A breadth-first flood fill joins 4-adjacent pixels whose
//     modes lie within the range radius. Each fill is one region.
// 4.  **Pruning**: Regions smaller than `min_density` pixels are merged into the
//     adjacent region with the closest mean mode, repeatedly, until none is left
//     or no small region has a neighbour.
// 5.  **Painting**: Every region is painted with the mean *input* colour of its
//     pixels, which is what the classifier consumes.
//
// The segmenter is a stateless utility. Its output depends only on the image and
// the parameters it was built with.

use crate::core_modules::color_image::ColorImage;
use crate::core_modules::pixel::pixel::{Luv, luv_distance_squared};
use crate::core_modules::segmenter::{
    Segmentation, SegmentationParams, Segmenter, compact_labels, four_neighbors, paint_region_means,
};
use crate::error::Result;

const MAX_ITERATIONS: usize = 10;
/// Squared joint shift (in bandwidth units) below which a pixel has converged.
const CONVERGENCE_EPSILON: f64 = 1e-3;
const MAX_PRUNING_PASSES: usize = 32;

#[derive(Debug, Clone)]
pub struct MeanShiftSegmenter {
    params: SegmentationParams,
}

impl MeanShiftSegmenter {
    pub fn new(params: SegmentationParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &SegmentationParams {
        &self.params
    }

    /// Mean-shift filtering. Returns the converged mode colour of every pixel.
    fn filter(&self, features: &[Luv], width: usize, height: usize) -> Vec<Luv> {
        let spatial = self.params.spatial_radius as f64;
        let spatial_sq = spatial * spatial;
        let range_sq = self.params.range_radius * self.params.range_radius;
        let reach = self.params.spatial_radius as i64;

        let mut modes = Vec::with_capacity(features.len());
        for y in 0..height {
            for x in 0..width {
                let mut center_x = x as f64;
                let mut center_y = y as f64;
                let mut color = features[y * width + x];

                for _ in 0..MAX_ITERATIONS {
                    let ix = center_x.round() as i64;
                    let iy = center_y.round() as i64;
                    let x0 = (ix - reach).max(0) as usize;
                    let x1 = (ix + reach).min(width as i64 - 1) as usize;
                    let y0 = (iy - reach).max(0) as usize;
                    let y1 = (iy + reach).min(height as i64 - 1) as usize;

                    let mut count = 0usize;
                    let mut sum_x = 0.0;
                    let mut sum_y = 0.0;
                    let mut sum_color = [0.0f64; 3];

                    for ny in y0..=y1 {
                        let dy = ny as f64 - center_y;
                        for nx in x0..=x1 {
                            let dx = nx as f64 - center_x;
                            if dx * dx + dy * dy > spatial_sq {
                                continue;
                            }
                            let candidate = &features[ny * width + nx];
                            if luv_distance_squared(candidate, &color) > range_sq {
                                continue;
                            }
                            count += 1;
                            sum_x += nx as f64;
                            sum_y += ny as f64;
                            for (sum, value) in sum_color.iter_mut().zip(candidate) {
                                *sum += value;
                            }
                        }
                    }

                    if count == 0 {
                        break;
                    }
                    let n = count as f64;
                    let next_x = sum_x / n;
                    let next_y = sum_y / n;
                    let next_color = [sum_color[0] / n, sum_color[1] / n, sum_color[2] / n];

                    let shift = ((next_x - center_x).powi(2) + (next_y - center_y).powi(2)) / spatial_sq
                        + luv_distance_squared(&next_color, &color) / range_sq;
                    center_x = next_x;
                    center_y = next_y;
                    color = next_color;
                    if shift < CONVERGENCE_EPSILON {
                        break;
                    }
                }
                modes.push(color);
            }
        }
        modes
    }

    /// Flood-fills 4-adjacent pixels with modes inside the range radius.
    fn fuse_regions(&self, modes: &[Luv], width: usize, height: usize) -> (Vec<u32>, usize) {
        let range_sq = self.params.range_radius * self.params.range_radius;
        let mut labels = vec![u32::MAX; modes.len()];
        let mut region_count = 0usize;
        let mut queue = Vec::new();

        for start in 0..modes.len() {
            if labels[start] != u32::MAX {
                continue;
            }
            let label = region_count as u32;
            region_count += 1;
            labels[start] = label;
            queue.push(start);

            while let Some(current) = queue.pop() {
                let (x, y) = (current % width, current / width);
                for (nx, ny) in four_neighbors(x, y, width, height) {
                    let neighbor = ny * width + nx;
                    if labels[neighbor] == u32::MAX
                        && luv_distance_squared(&modes[current], &modes[neighbor]) < range_sq
                    {
                        labels[neighbor] = label;
                        queue.push(neighbor);
                    }
                }
            }
        }
        (labels, region_count)
    }

    /// Merges regions below `min_density` pixels into their closest neighbour.
    fn prune_small_regions(&self, labels: &mut [u32], region_count: usize, modes: &[Luv], width: usize, height: usize) {
        let min_density = self.params.min_density;
        if min_density <= 1 || region_count <= 1 {
            return;
        }
        let mut regions = DisjointSet::new(region_count);

        for pass in 0..MAX_PRUNING_PASSES {
            let mut sizes = vec![0usize; region_count];
            let mut sums = vec![[0.0f64; 3]; region_count];
            for (label, mode) in labels.iter().zip(modes) {
                let root = regions.find(*label as usize);
                sizes[root] += 1;
                for (sum, value) in sums[root].iter_mut().zip(mode) {
                    *sum += value;
                }
            }
            let means: Vec<Luv> = sums
                .iter()
                .zip(&sizes)
                .map(|(sum, &size)| {
                    let n = size.max(1) as f64;
                    [sum[0] / n, sum[1] / n, sum[2] / n]
                })
                .collect();

            let mut best: Vec<Option<(f64, usize)>> = vec![None; region_count];
            let consider = |small: usize, other: usize, best: &mut [Option<(f64, usize)>]| {
                let distance = luv_distance_squared(&means[small], &means[other]);
                match best[small] {
                    Some((current, _)) if current <= distance => {}
                    _ => best[small] = Some((distance, other)),
                }
            };

            for y in 0..height {
                for x in 0..width {
                    let a = regions.find(labels[y * width + x] as usize);
                    for (nx, ny) in [(x + 1, y), (x, y + 1)] {
                        if nx >= width || ny >= height {
                            continue;
                        }
                        let b = regions.find(labels[ny * width + nx] as usize);
                        if a == b {
                            continue;
                        }
                        if sizes[a] < min_density {
                            consider(a, b, &mut best);
                        }
                        if sizes[b] < min_density {
                            consider(b, a, &mut best);
                        }
                    }
                }
            }

            let mut merged = 0usize;
            for (small, choice) in best.iter().enumerate() {
                if let Some((_, target)) = choice {
                    if regions.union(small, *target) {
                        merged += 1;
                    }
                }
            }
            tracing::trace!(pass, merged, "pruned small regions");
            if merged == 0 {
                break;
            }
        }

        for label in labels.iter_mut() {
            *label = regions.find(*label as usize) as u32;
        }
    }
}

impl Default for MeanShiftSegmenter {
    fn default() -> Self {
        Self {
            params: SegmentationParams::default(),
        }
    }
}

impl Segmenter for MeanShiftSegmenter {
    fn name(&self) -> &'static str {
        "mean_shift"
    }

    fn segment(&self, image: &ColorImage) -> Result<Segmentation> {
        let (width, height) = image.shape();
        let features: Vec<Luv> = image.pixels().iter().map(|p| p.to_luv()).collect();

        let modes = self.filter(&features, width, height);
        let (mut labels, fused) = self.fuse_regions(&modes, width, height);
        self.prune_small_regions(&mut labels, fused, &modes, width, height);
        let region_count = compact_labels(&mut labels);

        tracing::debug!(fused, region_count, "mean shift regions");

        let segmented = paint_region_means(image, &labels, region_count)?;
        Ok(Segmentation {
            segmented,
            labels,
            region_count,
        })
    }
}

/// Union-find over region labels.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    /// Returns false when both nodes were already joined.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }
        self.parent[root_a] = root_b;
        true
    }
}
