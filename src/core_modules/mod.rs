pub mod channel;
pub mod chunk;
pub mod color_image;
pub mod mean_shift;
pub mod pixel;
pub mod segmenter;
pub mod threshold;
pub mod utils;
pub mod vegetation;
