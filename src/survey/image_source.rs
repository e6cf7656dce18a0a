//! Where heading images come from.

use crate::error::{GreenViewError, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Supplies the image of one panorama looking along one heading.
pub trait ImageSource: Send + Sync {
    fn fetch(&self, pano_id: &str, heading: f64) -> Result<RgbImage>;
}

/// Cache file name of a heading image, e.g. `abc_60.0.jpg`.
pub fn image_file_name(pano_id: &str, heading: f64) -> String {
    format!("{}_{:.1}.jpg", pano_id, heading)
}

/// Reads heading images from a local directory.
#[derive(Debug, Clone)]
pub struct DirectoryImageSource {
    root: PathBuf,
}

impl DirectoryImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, pano_id: &str, heading: f64) -> PathBuf {
        self.root.join(image_file_name(pano_id, heading))
    }

    pub fn contains(&self, pano_id: &str, heading: f64) -> bool {
        self.path_for(pano_id, heading).is_file()
    }

    pub fn store(&self, pano_id: &str, heading: f64, image: &RgbImage) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        image.save(self.path_for(pano_id, heading))?;
        Ok(())
    }
}

impl ImageSource for DirectoryImageSource {
    fn fetch(&self, pano_id: &str, heading: f64) -> Result<RgbImage> {
        let path = self.path_for(pano_id, heading);
        let image = image::open(&path).map_err(|e| GreenViewError::ImageUnavailable {
            pano_id: pano_id.to_string(),
            heading,
            reason: format!("{}: {}", path.display(), e),
        })?;
        Ok(image.to_rgb8())
    }
}

/// Serves images from a local cache, falling back to an inner source and
/// saving what it fetches.
pub struct CachingImageSource {
    cache: DirectoryImageSource,
    inner: Arc<dyn ImageSource>,
}

impl CachingImageSource {
    pub fn new(cache: DirectoryImageSource, inner: Arc<dyn ImageSource>) -> Self {
        Self { cache, inner }
    }
}

impl ImageSource for CachingImageSource {
    fn fetch(&self, pano_id: &str, heading: f64) -> Result<RgbImage> {
        if self.cache.contains(pano_id, heading) {
            return self.cache.fetch(pano_id, heading);
        }
        let image = self.inner.fetch(pano_id, heading)?;
        debug!(pano_id, heading, "caching fetched image");
        self.cache.store(pano_id, heading, &image)?;
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    impl ImageSource for CountingSource {
        fn fetch(&self, _pano_id: &str, _heading: f64) -> Result<RgbImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RgbImage::from_pixel(4, 4, image::Rgb([10, 200, 10])))
        }
    }

    #[test]
    fn file_names_use_one_decimal() {
        assert_eq!(image_file_name("abc", 0.0), "abc_0.0.jpg");
        assert_eq!(image_file_name("abc", 60.0), "abc_60.0.jpg");
        assert_eq!(image_file_name("abc", 22.5), "abc_22.5.jpg");
    }

    #[test]
    fn directory_source_reports_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectoryImageSource::new(dir.path());
        match source.fetch("nothing", 120.0) {
            Err(GreenViewError::ImageUnavailable { pano_id, heading, .. }) => {
                assert_eq!(pano_id, "nothing");
                assert_eq!(heading, 120.0);
            }
            other => panic!("unexpected result: {:?}", other.map(|i| i.dimensions())),
        }
    }

    #[test]
    fn caching_source_fetches_once() {
        let dir = tempfile::tempdir().unwrap();
        let inner = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let source = CachingImageSource::new(DirectoryImageSource::new(dir.path()), inner.clone());

        let first = source.fetch("pano", 60.0).unwrap();
        let second = source.fetch("pano", 60.0).unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.dimensions(), second.dimensions());
        assert!(dir.path().join("pano_60.0.jpg").is_file());
    }
}
