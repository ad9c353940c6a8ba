use super::types::{Detection, DetectionParams};
use crate::geometry::{external_contours, BoundingBox, GeometryFilter};
use crate::preprocess::{absdiff, binarize};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Difference two preprocessed frames and box the regions that changed
///
/// `reference` and `current` must have the frame's dimensions; callers check
/// this before getting here.
pub(crate) fn detect_changes(
    frame: &RgbImage,
    reference: &GrayImage,
    current: &GrayImage,
    params: &DetectionParams,
    filter: &GeometryFilter,
) -> Detection {
    let _span = tracing::debug_span!("detect_changes").entered();

    let diff = absdiff(reference, current);
    let mut mask = binarize(&diff, params.threshold);

    // n passes of a 3x3 square dilation equal one pass with an L-inf radius of n
    if params.dilate_iterations > 0 {
        mask = imageproc::morphology::dilate(&mask, Norm::LInf, params.dilate_iterations);
    }

    let contours = filter.filter(external_contours(&mask), params.min_area);
    let boxes: Vec<BoundingBox> = contours
        .iter()
        .filter_map(|c| BoundingBox::of(c))
        .collect();

    tracing::debug!("{} motion regions", boxes.len());

    Detection {
        annotated: draw_boxes(frame, &boxes),
        boxes,
    }
}

/// Copy `frame` and draw a 2 pixel outline around every box
pub fn draw_boxes(frame: &RgbImage, boxes: &[BoundingBox]) -> RgbImage {
    let mut annotated = frame.clone();

    for b in boxes {
        let outer = Rect::at(b.x as i32, b.y as i32).of_size(b.width + 1, b.height + 1);
        draw_hollow_rect_mut(&mut annotated, outer, BOX_COLOR);

        if b.width > 1 && b.height > 1 {
            let inner = Rect::at(b.x as i32 + 1, b.y as i32 + 1).of_size(b.width - 1, b.height - 1);
            draw_hollow_rect_mut(&mut annotated, inner, BOX_COLOR);
        }
    }

    annotated
}
