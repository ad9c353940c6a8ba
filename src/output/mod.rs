mod image_dir;

pub use image_dir::ImageDirSink;

use anyhow::Result;
use image::{GrayImage, RgbImage};

/// Trait for output destinations
pub trait OutputSink {
    /// Write a frame under `label`
    fn write_frame(&mut self, label: &str, frame: &RgbImage) -> Result<()>;

    /// Write a single-channel mask under `label`
    fn write_mask(&mut self, label: &str, mask: &GrayImage) -> Result<()>;
}
