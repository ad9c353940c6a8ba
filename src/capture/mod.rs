mod image_sequence;

pub use image_sequence::{load_frame, ImageSequence};

use anyhow::Result;
use image::RgbImage;

/// Trait for indexed frame sources
pub trait FrameSource {
    /// Decode the frame at `index`
    ///
    /// Fails when the index is out of range or the frame cannot be decoded.
    fn get_frame(&self, index: usize) -> Result<RgbImage>;

    /// Number of frames available
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the resolution of the frames, if known
    fn resolution(&self) -> Option<(u32, u32)>;
}
