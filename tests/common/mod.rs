#![allow(dead_code)]

use green_view::ColorImage;
use green_view::core_modules::pixel::pixel::Pixel;
use image::RgbImage;
use std::path::Path;

pub const FRAME: usize = 400;

pub const LEAF: Pixel = Pixel {
    red: 0.1,
    green: 0.8,
    blue: 0.1,
};

pub const GREY: Pixel = Pixel {
    red: 0.5,
    green: 0.5,
    blue: 0.5,
};

pub fn solid(width: usize, height: usize, pixel: Pixel) -> ColorImage {
    ColorImage::filled(width, height, pixel).expect("valid solid image")
}

pub fn solid_frame(pixel: Pixel) -> ColorImage {
    solid(FRAME, FRAME, pixel)
}

/// A grey frame whose first `count` pixels in row-major order are `marked`.
pub fn frame_with_marked_pixels(count: usize, marked: Pixel) -> ColorImage {
    ColorImage::from_fn(FRAME, FRAME, |x, y| if y * FRAME + x < count { marked } else { GREY })
        .expect("valid marked image")
}

/// Left half `left`, right half `right`.
pub fn split_scene(width: usize, height: usize, left: Pixel, right: Pixel) -> ColorImage {
    ColorImage::from_fn(width, height, |x, _| if x < width / 2 { left } else { right })
        .expect("valid split image")
}

pub fn write_solid_jpeg(path: &Path, width: u32, height: u32, rgb: [u8; 3]) {
    RgbImage::from_pixel(width, height, image::Rgb(rgb))
        .save(path)
        .expect("Error Saving File.");
}
