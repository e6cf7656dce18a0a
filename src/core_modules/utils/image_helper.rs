pub mod image_helper {
    use crate::core_modules::channel::Mask;
    use crate::core_modules::color_image::ColorImage;
    use image::ImageEncoder;
    use std::path::Path;

    const MASK_ON: u8 = 255;

    fn save(
        path: &Path,
        width: u32,
        height: u32,
        buffer: &[u8],
        color_type: image::ExtendedColorType,
    ) -> Result<(), image::error::ImageError> {
        let output = std::io::BufWriter::new(std::fs::File::create(path)?);
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(buffer, width, height, color_type)?;

        Ok(())
    }

    /// Writes a mask as a black/white grayscale PNG.
    pub fn save_mask(path: &Path, mask: &Mask) -> Result<(), image::error::ImageError> {
        let buffer: Vec<u8> = mask.bits().iter().map(|&on| if on { MASK_ON } else { 0 }).collect();
        save(
            path,
            mask.width() as u32,
            mask.height() as u32,
            &buffer,
            image::ExtendedColorType::L8,
        )
    }

    /// Writes a normalized image as an 8-bit RGB PNG.
    pub fn save_color_image(path: &Path, image: &ColorImage) -> Result<(), image::error::ImageError> {
        let rgb = image.to_rgb_image();
        save(path, rgb.width(), rgb.height(), rgb.as_raw(), image::ExtendedColorType::Rgb8)
    }
}

#[cfg(test)]
mod tests {

    use super::image_helper::*;
    use crate::core_modules::channel::Mask;
    use crate::core_modules::color_image::ColorImage;
    use crate::core_modules::pixel::pixel::Pixel;

    #[test]
    fn save_mask_file() {
        let dir = tempfile::tempdir().expect("Error creating temp dir.");
        let path = dir.path().join("mask.png");
        let mask = Mask::new(3, 2, vec![true, false, true, false, false, true]).unwrap();

        save_mask(&path, &mask).expect("Error Saving File.");

        let loaded = image::open(&path).expect("Error Loading File.").to_luma8();
        assert_eq!(loaded.dimensions(), (3, 2));
        assert_eq!(loaded.get_pixel(0, 0).0, [255]);
        assert_eq!(loaded.get_pixel(1, 0).0, [0]);
        assert_eq!(loaded.get_pixel(2, 1).0, [255]);
    }

    #[test]
    fn save_gradient_file() {
        let dir = tempfile::tempdir().expect("Error creating temp dir.");
        let path = dir.path().join("gradient.png");
        let image = ColorImage::from_fn(16, 4, |x, _| {
            let intensity = x as f64 / 15.0;
            Pixel::new(intensity, intensity, intensity)
        })
        .unwrap();

        save_color_image(&path, &image).expect("Error Saving File.");

        let loaded = image::open(&path).expect("Error Loading File.").to_rgb8();
        assert_eq!(loaded, image.to_rgb_image());
    }
}
