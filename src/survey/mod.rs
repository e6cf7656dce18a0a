//! The survey driver: panorama metadata in, Green View Index records out.

pub mod image_source;
pub mod metadata;
pub mod point;
pub mod record;
pub mod runner;

pub use image_source::{CachingImageSource, DirectoryImageSource, ImageSource};
pub use metadata::{PanoramaRecord, parse_metadata, read_metadata_file};
pub use point::{FAILURE_SENTINEL, headings, measure_point};
pub use record::{GreenViewRecord, result_file_name, write_records};
pub use runner::{FileOutcome, SurveyRunner, SurveySummary};
