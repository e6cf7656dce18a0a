//! Normalized RGB images.
//!
//! Every `ColorImage` holds finite channels in [0, 1]; the constructors are the
//! only way in, so downstream code never re-checks.

use crate::core_modules::channel::ChannelArray;
use crate::core_modules::pixel::pixel::Pixel;
use crate::error::{GreenViewError, Result};
use image::RgbImage;

#[derive(Debug, Clone, PartialEq)]
pub struct ColorImage {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl ColorImage {
    /// Validates and wraps row-major pixels.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Pixel>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GreenViewError::InvalidInput(format!(
                "image must not be empty, got {}x{}",
                width, height
            )));
        }
        if pixels.len() != width * height {
            return Err(GreenViewError::InvalidInput(format!(
                "{}x{} image needs {} pixels, got {}",
                width,
                height,
                width * height,
                pixels.len()
            )));
        }
        if let Some(index) = pixels.iter().position(|p| !p.is_normalized()) {
            return Err(GreenViewError::InvalidInput(format!(
                "pixel ({}, {}) = {:?} is not a finite value in [0, 1]",
                index % width,
                index / width,
                pixels[index]
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// A single-colour image.
    pub fn filled(width: usize, height: usize, pixel: Pixel) -> Result<Self> {
        Self::from_pixels(width, height, vec![pixel; width * height])
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> Pixel) -> Result<Self> {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self::from_pixels(width, height, pixels)
    }

    /// Converts an 8-bit image, dividing every channel by 255.
    pub fn from_rgb_image(image: &RgbImage) -> Result<Self> {
        let pixels = image.pixels().map(|p| Pixel::from(*p)).collect();
        Self::from_pixels(image.width() as usize, image.height() as usize, pixels)
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        let mut buffer = Vec::with_capacity(self.pixels.len() * 3);
        for pixel in &self.pixels {
            buffer.extend_from_slice(&pixel.to_bytes());
        }
        RgbImage::from_vec(self.width as u32, self.height as u32, buffer)
            .unwrap_or_else(|| RgbImage::new(self.width as u32, self.height as u32))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<&Pixel> {
        if x < self.width && y < self.height {
            self.pixels.get(y * self.width + x)
        } else {
            None
        }
    }

    /// Builds a channel array by evaluating `f` on every pixel.
    pub fn channel_map(&self, f: impl Fn(&Pixel) -> f64) -> ChannelArray {
        ChannelArray::from_fn(self.width, self.height, |x, y| f(&self.pixels[y * self.width + x]))
    }

    /// Splits into red, green and blue channel arrays.
    pub fn split_channels(&self) -> (ChannelArray, ChannelArray, ChannelArray) {
        (
            self.channel_map(|p| p.red),
            self.channel_map(|p| p.green),
            self.channel_map(|p| p.blue),
        )
    }
}
