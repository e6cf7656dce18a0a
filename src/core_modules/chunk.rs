// THEORY:
// The `Chunk` module represents a rectangular grouping of pixels, and the
// `ChunkSegmenter` turns a whole image into a grid of them.
//
// Key architectural principles:
// 1.  **Spatial Pooling**: Averaging a block cancels single-pixel noise, which is the
//     one property the vegetation rules need from a segmentation.
// 2.  **Trivially Contiguous**: Every block is a rectangle, so the segmenter contract
//     (one connected region per label) holds by construction.
// 3.  **Cheap Substitute**: It ignores colour edges entirely. It exists for fast
//     surveys and tests where mean shift would be too slow, not as a replacement
//     for object-based segmentation.
//
// Blocks on the right and bottom edges are truncated when the image size is not a
// multiple of the block size.

pub mod chunk {
    use crate::core_modules::color_image::ColorImage;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::core_modules::segmenter::{Segmentation, Segmenter};
    use crate::error::{GreenViewError, Result};

    /// A "dumb" data container representing a rectangular block of pixels.
    pub struct Chunk {
        /// The width of the chunk in pixels.
        pub width: usize,
        /// The height of the chunk in pixels.
        pub height: usize,
        /// A flattened vector containing all the `Pixel` data within this chunk.
        pub pixels: Vec<Pixel>,
    }

    impl Chunk {
        pub fn new(width: usize, height: usize, pixels: Vec<Pixel>) -> Self {
            Self { width, height, pixels }
        }

        /// Calculates the average pixel value for the entire chunk.
        pub fn average_pixel(&self) -> Pixel {
            let num_pixels = self.pixels.len();
            if num_pixels == 0 {
                return Pixel::default();
            }

            let mut sum_r = 0.0f64;
            let mut sum_g = 0.0f64;
            let mut sum_b = 0.0f64;
            for pixel in &self.pixels {
                sum_r += pixel.red;
                sum_g += pixel.green;
                sum_b += pixel.blue;
            }

            let n = num_pixels as f64;
            Pixel::new(
                (sum_r / n).clamp(0.0, 1.0),
                (sum_g / n).clamp(0.0, 1.0),
                (sum_b / n).clamp(0.0, 1.0),
            )
        }
    }

    /// Segments an image into a fixed grid of blocks painted with their mean colour.
    #[derive(Debug, Clone)]
    pub struct ChunkSegmenter {
        chunk_width: usize,
        chunk_height: usize,
    }

    impl ChunkSegmenter {
        pub fn new(chunk_width: usize, chunk_height: usize) -> Result<Self> {
            if chunk_width == 0 || chunk_height == 0 {
                return Err(GreenViewError::Config(format!(
                    "chunk size must be positive, got {}x{}",
                    chunk_width, chunk_height
                )));
            }
            Ok(Self {
                chunk_width,
                chunk_height,
            })
        }

        fn extract_chunk(&self, image: &ColorImage, chunk_x: usize, chunk_y: usize) -> Chunk {
            let start_x = chunk_x * self.chunk_width;
            let start_y = chunk_y * self.chunk_height;
            let width = self.chunk_width.min(image.width() - start_x);
            let height = self.chunk_height.min(image.height() - start_y);

            let mut pixels = Vec::with_capacity(width * height);
            for y in start_y..start_y + height {
                for x in start_x..start_x + width {
                    if let Some(pixel) = image.pixel(x, y) {
                        pixels.push(*pixel);
                    }
                }
            }
            Chunk::new(width, height, pixels)
        }
    }

    impl Segmenter for ChunkSegmenter {
        fn name(&self) -> &'static str {
            "chunk"
        }

        fn segment(&self, image: &ColorImage) -> Result<Segmentation> {
            let grid_width = image.width().div_ceil(self.chunk_width);
            let grid_height = image.height().div_ceil(self.chunk_height);

            let mut averages = Vec::with_capacity(grid_width * grid_height);
            for chunk_y in 0..grid_height {
                for chunk_x in 0..grid_width {
                    averages.push(self.extract_chunk(image, chunk_x, chunk_y).average_pixel());
                }
            }

            let mut labels = Vec::with_capacity(image.pixel_count());
            let mut pixels = Vec::with_capacity(image.pixel_count());
            for y in 0..image.height() {
                for x in 0..image.width() {
                    let label = (y / self.chunk_height) * grid_width + x / self.chunk_width;
                    labels.push(label as u32);
                    pixels.push(averages[label]);
                }
            }

            Ok(Segmentation {
                segmented: ColorImage::from_pixels(image.width(), image.height(), pixels)?,
                labels,
                region_count: grid_width * grid_height,
            })
        }
    }
}
