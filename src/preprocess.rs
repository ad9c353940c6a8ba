use crate::error::{check_frame, Result};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::ThresholdType;
use imageproc::map::map_colors2;

/// Side of the square Gaussian kernel applied before differencing
pub const BLUR_KERNEL_SIZE: u32 = 15;

/// Preprocessor turning colour frames into blurred grayscale frames
///
/// Every motion strategy runs both sides of its difference through the same
/// preprocessor, so a frame and its reference are always comparable.
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    sigma: f32,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(BLUR_KERNEL_SIZE)
    }
}

impl Preprocessor {
    /// Create a preprocessor for a `kernel_size`×`kernel_size` blur
    ///
    /// The sigma is derived from the kernel size, the same way a zero sigma is
    /// resolved for a fixed-size Gaussian kernel.
    pub fn new(kernel_size: u32) -> Self {
        Self {
            sigma: blur_sigma(kernel_size),
        }
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    /// Convert a colour frame into a blurred grayscale frame
    ///
    /// Steps:
    /// 1. Reject empty frames
    /// 2. Convert to BT.601 luma
    /// 3. Gaussian blur
    pub fn preprocess(&self, frame: &RgbImage) -> Result<GrayImage> {
        let _span = tracing::debug_span!("preprocess").entered();

        check_frame(frame.dimensions())?;

        let gray = to_gray(frame);
        Ok(imageproc::filter::gaussian_blur_f32(&gray, self.sigma))
    }
}

/// Sigma implied by a Gaussian kernel of the given size
pub fn blur_sigma(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Convert an RGB frame to single-channel luma (0.299 R + 0.587 G + 0.114 B)
pub fn to_gray(frame: &RgbImage) -> GrayImage {
    let (width, height) = frame.dimensions();

    GrayImage::from_fn(width, height, |x, y| Luma([luma(frame.get_pixel(x, y))]))
}

/// BT.601 luma of a single pixel
pub fn luma(pixel: &Rgb<u8>) -> u8 {
    let value = 0.299 * pixel[0] as f32 + 0.587 * pixel[1] as f32 + 0.114 * pixel[2] as f32;
    value.round().clamp(0.0, 255.0) as u8
}

/// Per-pixel absolute difference of two equally sized grayscale images
pub fn absdiff(a: &GrayImage, b: &GrayImage) -> GrayImage {
    map_colors2(a, b, |p: Luma<u8>, q: Luma<u8>| Luma([p[0].abs_diff(q[0])]))
}

/// Binary threshold: pixels strictly above `threshold` become 255, the rest 0
pub fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    imageproc::contrast::threshold(image, threshold, ThresholdType::Binary)
}
