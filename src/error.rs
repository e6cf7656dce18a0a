//! Error types for the green view engine.

use thiserror::Error;

/// Everything that can go wrong between an input image and a persisted record.
///
/// A degenerate histogram is deliberately absent: the threshold selector
/// resolves it with the caller's fallback level instead of failing.
#[derive(Error, Debug)]
pub enum GreenViewError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("segmenter contract violated: {0}")]
    SegmenterContract(String),

    #[error("image area {actual_pixels} does not match the expected {expected_pixels} pixels")]
    DimensionMismatch {
        expected_pixels: usize,
        actual_pixels: usize,
    },

    #[error("image for panorama {pano_id} at heading {heading} unavailable: {reason}")]
    ImageUnavailable {
        pano_id: String,
        heading: f64,
        reason: String,
    },

    #[error("metadata error: {0}")]
    Metadata(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("worker pool error: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, GreenViewError>;
