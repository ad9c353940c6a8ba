//! Stateless frame-to-frame helpers used when preparing camera footage

use image::imageops::{self, crop_imm};
use image::{Rgb, RgbImage};

/// Half side of the square kept by [`crop_center`] for the reference setup
pub const CENTER_CROP_HALF: u32 = 878;

/// Cut columns `div_left..=div_right` out of a frame and split them in two
///
/// Bounds are clamped to the frame.
pub fn split_frame(frame: &RgbImage, div_left: u32, div_right: u32) -> (RgbImage, RgbImage) {
    let (width, height) = frame.dimensions();
    let left = div_left.min(width);
    let right = div_right.saturating_add(1).min(width).max(left);

    let span = crop_imm(frame, left, 0, right - left, height).to_image();
    let half = span.width() / 2;

    (
        crop_imm(&span, 0, 0, half, height).to_image(),
        crop_imm(&span, half, 0, span.width() - half, height).to_image(),
    )
}

/// Square crop of side `2 * half + 1` around the frame centre, clamped
pub fn crop_center(frame: &RgbImage, half: u32) -> RgbImage {
    let (width, height) = frame.dimensions();
    let (cx, cy) = (width / 2, height / 2);

    let x0 = cx.saturating_sub(half);
    let y0 = cy.saturating_sub(half);
    let x1 = cx.saturating_add(half + 1).min(width);
    let y1 = cy.saturating_add(half + 1).min(height);

    crop_imm(frame, x0, y0, x1 - x0, y1 - y0).to_image()
}

/// Bring the four-camera rig to a common orientation
///
/// The third frame is rotated clockwise, every other frame counter-clockwise,
/// then each is centre-cropped. A counter-clockwise crop of the third frame is
/// appended as a fifth view.
pub fn rotate_and_crop(frames: &[RgbImage], half: u32) -> Vec<RgbImage> {
    let mut out: Vec<RgbImage> = frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            let rotated = if i == 2 {
                imageops::rotate90(frame)
            } else {
                imageops::rotate270(frame)
            };
            crop_center(&rotated, half)
        })
        .collect();

    if let Some(third) = frames.get(2) {
        out.push(crop_center(&imageops::rotate270(third), half));
    }

    out
}

/// Black out the stands: the top-left `left_width`×`left_height` block of the
/// left frame and everything right of `right_width` (up to `right_height`
/// rows) in the right frame
///
/// `None` or oversized bounds cover the whole frame.
pub fn black_box(
    left: &mut RgbImage,
    right: &mut RgbImage,
    left_size: (Option<u32>, Option<u32>),
    right_size: (Option<u32>, Option<u32>),
) {
    let clamp = |value: Option<u32>, limit: u32| {
        value
            .filter(|&v| v < limit)
            .unwrap_or(limit.saturating_sub(1))
    };

    let lw = clamp(left_size.0, left.width());
    let lh = clamp(left_size.1, left.height());
    fill(left, 0..lw + 1, 0..lh + 1);

    let rw = clamp(right_size.0, right.width());
    let rh = clamp(right_size.1, right.height());
    let right_width = right.width();
    fill(right, rw..right_width, 0..rh + 1);
}

/// Zero every column outside `min..max`
pub fn keep_columns(frame: &mut RgbImage, min: u32, max: u32) {
    let width = frame.width();
    let height = frame.height();

    fill(frame, 0..min.min(width), 0..height);
    fill(frame, max.min(width)..width, 0..height);
}

fn fill(frame: &mut RgbImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) {
    let (width, height) = frame.dimensions();

    for y in ys.start..ys.end.min(height) {
        for x in xs.start..xs.end.min(width) {
            frame.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }
}
