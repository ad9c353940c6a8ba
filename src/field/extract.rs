use super::hsv::{rgb_to_hsv, HsvRange};
use crate::error::{check_frame, Error, Result};
use crate::geometry::{all_contours, contour_area, external_contours, Contour, FieldBoundary};
use crate::preprocess::luma;
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;

/// Tolerance, in pixels, used to simplify the extracted field outline
const OUTLINE_EPSILON: f64 = 2.0;

/// Which half of a split court a camera looks at
///
/// The court line bounding a left frame is the one furthest right, and the
/// field extends from it towards the right edge; mirrored for a right frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Extreme x of a contour: rightmost for `Left`, leftmost for `Right`
    pub fn extreme(&self, points: &[Point<i32>]) -> Option<i32> {
        let xs = points.iter().map(|p| p.x);
        match self {
            Side::Left => xs.max(),
            Side::Right => xs.min(),
        }
    }

    /// Whether a contour with extreme `candidate` beats the current `best`
    ///
    /// Ties go to the candidate, so the last of equally placed contours wins.
    pub fn prefers(&self, candidate: i32, best: i32) -> bool {
        match self {
            Side::Left => candidate >= best,
            Side::Right => candidate <= best,
        }
    }

    /// Fill one mask row from its side-relevant pixel to the frame edge
    fn fill_row(&self, row: &mut [u8]) {
        match self {
            Side::Left => {
                if let Some(first) = row.iter().position(|&v| v != 0) {
                    row[first..].fill(255);
                }
            }
            Side::Right => {
                if let Some(last) = row.iter().rposition(|&v| v != 0) {
                    row[..=last].fill(255);
                }
            }
        }
    }
}

/// Field image, its binary mask and the outline of the masked region
#[derive(Debug, Clone)]
pub struct FieldExtraction {
    /// Input frame with everything outside the field blacked out
    pub field: RgbImage,
    /// 255 on the field, 0 elsewhere
    pub mask: GrayImage,
    /// Simplified outline of the mask
    pub outline: Contour,
}

impl FieldExtraction {
    /// Region-of-interest for the motion strategies built from the outline
    pub fn to_boundary(&self, margin: f64) -> Result<FieldBoundary> {
        FieldBoundary::new(
            self.outline
                .iter()
                .map(|p| Point::new(p.x as f64, p.y as f64))
                .collect(),
            margin,
        )
    }
}

/// Segments the playing field by the colour of its boundary line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldExtractor {
    pub line_color: Rgb<u8>,
    /// Allowed hue distance from the line colour
    pub tolerance: u8,
    /// Line contours enclosing less than this are ignored
    pub min_area: f64,
    pub saturation_floor: u8,
    pub value_floor: u8,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self {
            line_color: Rgb([22, 63, 177]),
            tolerance: 8,
            min_area: 10000.0,
            saturation_floor: 50,
            value_floor: 50,
        }
    }
}

impl FieldExtractor {
    pub fn new(line_color: Rgb<u8>, tolerance: u8) -> Self {
        Self {
            line_color,
            tolerance,
            ..Self::default()
        }
    }

    /// Binary mask of the pixels matching the line colour
    pub fn line_mask(&self, frame: &RgbImage) -> GrayImage {
        let range = HsvRange::around(
            self.line_color,
            self.tolerance,
            self.saturation_floor,
            self.value_floor,
        );
        let (width, height) = frame.dimensions();

        GrayImage::from_fn(width, height, |x, y| {
            let pixel = frame.get_pixel(x, y);
            let keep = range.contains(rgb_to_hsv(*pixel)) && luma(pixel) > 1;
            Luma([if keep { 255 } else { 0 }])
        })
    }

    /// Extract the field on `side` of a frame
    ///
    /// Fails with [`Error::NoCandidate`] when no line contour is large enough.
    pub fn extract(&self, frame: &RgbImage, side: Side) -> Result<FieldExtraction> {
        let _span = tracing::debug_span!("field_extract").entered();

        check_frame(frame.dimensions())?;

        let lines = self.line_mask(frame);
        let candidates: Vec<Contour> = all_contours(&lines)
            .into_iter()
            .filter(|c| contour_area(c) >= self.min_area)
            .collect();

        tracing::debug!("{} line contours above {}", candidates.len(), self.min_area);

        let mut best: Option<(i32, Contour)> = None;
        for contour in candidates {
            let Some(extreme) = side.extreme(&contour) else {
                continue;
            };
            if best.as_ref().map_or(true, |(b, _)| side.prefers(extreme, *b)) {
                best = Some((extreme, contour));
            }
        }

        let (extreme, mut line) = best.ok_or(Error::NoCandidate {
            min_area: self.min_area,
        })?;

        tracing::debug!("Selected {:?} line contour with extreme x {}", side, extreme);

        let (width, height) = frame.dimensions();
        let mut mask = GrayImage::new(width, height);

        while line.len() > 1 && line.first() == line.last() {
            line.pop();
        }
        draw_polygon_mut(&mut mask, &line, Luma([255]));

        // Rebuild a solid region where the traced line has gaps
        for row in mask.chunks_mut(width as usize) {
            side.fill_row(row);
        }

        let field = RgbImage::from_fn(width, height, |x, y| {
            if mask.get_pixel(x, y)[0] != 0 {
                *frame.get_pixel(x, y)
            } else {
                Rgb([0, 0, 0])
            }
        });

        let outline = external_contours(&mask)
            .into_iter()
            .max_by(|a, b| contour_area(a).total_cmp(&contour_area(b)))
            .map(|c| approximate_polygon_dp(&c, OUTLINE_EPSILON, true))
            .unwrap_or_default();

        Ok(FieldExtraction {
            field,
            mask,
            outline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: Rgb<u8> = Rgb([22, 63, 177]);
    const GRASS: Rgb<u8> = Rgb([40, 140, 60]);

    /// 400x200 frame with a line-coloured block covering columns `x0..x1`,
    /// rows 20..180
    fn court(x0: u32, x1: u32) -> RgbImage {
        RgbImage::from_fn(400, 200, |x, y| {
            if (x0..x1).contains(&x) && (20..180).contains(&y) {
                LINE
            } else {
                GRASS
            }
        })
    }

    fn first_set(mask: &GrayImage, y: u32) -> Option<u32> {
        (0..mask.width()).find(|&x| mask.get_pixel(x, y)[0] != 0)
    }

    fn last_set(mask: &GrayImage, y: u32) -> Option<u32> {
        (0..mask.width()).rev().find(|&x| mask.get_pixel(x, y)[0] != 0)
    }

    #[test]
    fn test_side_selection() {
        let a = vec![Point::new(10, 0), Point::new(50, 5)];
        assert_eq!(Side::Left.extreme(&a), Some(50));
        assert_eq!(Side::Right.extreme(&a), Some(10));
        assert!(Side::Left.prefers(60, 50));
        assert!(Side::Left.prefers(50, 50));
        assert!(!Side::Right.prefers(60, 50));
        assert_eq!(Side::Left.extreme(&[]), None);
    }

    #[test]
    fn test_fill_row() {
        let mut row = [0, 0, 255, 0, 255, 0];
        Side::Left.fill_row(&mut row);
        assert_eq!(row, [0, 0, 255, 255, 255, 255]);

        let mut row = [0, 255, 0, 255, 0, 0];
        Side::Right.fill_row(&mut row);
        assert_eq!(row, [255, 255, 255, 255, 0, 0]);

        let mut row = [0; 4];
        Side::Left.fill_row(&mut row);
        assert_eq!(row, [0; 4]);
    }

    #[test]
    fn test_line_mask_keeps_line_colour() {
        let mask = FieldExtractor::default().line_mask(&court(100, 200));
        assert_eq!(mask.get_pixel(150, 100)[0], 255);
        assert_eq!(mask.get_pixel(50, 100)[0], 0);
        assert_eq!(mask.get_pixel(150, 10)[0], 0);
    }

    #[test]
    fn test_left_field_extends_right() {
        let frame = court(100, 200);
        let extraction = FieldExtractor::default().extract(&frame, Side::Left).unwrap();
        let mask = &extraction.mask;

        let left = first_set(mask, 100).unwrap();
        assert!(left.abs_diff(100) <= 1);
        assert_eq!(last_set(mask, 100), Some(399));
        assert_eq!(first_set(mask, 5), None);
        assert_eq!(first_set(mask, 195), None);

        assert_eq!(extraction.field.get_pixel(300, 100), &GRASS);
        assert_eq!(extraction.field.get_pixel(50, 100), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_right_field_extends_left() {
        let frame = court(100, 200);
        let extraction = FieldExtractor::default().extract(&frame, Side::Right).unwrap();
        let mask = &extraction.mask;

        assert_eq!(first_set(mask, 100), Some(0));
        let right = last_set(mask, 100).unwrap();
        assert!(right.abs_diff(199) <= 1);
    }

    #[test]
    fn test_picks_outermost_line() {
        // Two candidate lines; a left frame keeps the one reaching furthest right
        let frame = RgbImage::from_fn(400, 200, |x, y| {
            let rows = (20..180).contains(&y);
            if rows && ((20..100).contains(&x) || (250..330).contains(&x)) {
                LINE
            } else {
                GRASS
            }
        });

        let left = FieldExtractor::default().extract(&frame, Side::Left).unwrap();
        assert!(first_set(&left.mask, 100).unwrap().abs_diff(250) <= 1);

        let right = FieldExtractor::default().extract(&frame, Side::Right).unwrap();
        assert!(last_set(&right.mask, 100).unwrap().abs_diff(99) <= 1);
    }

    #[test]
    fn test_small_lines_are_no_candidate() {
        let frame = court(100, 130);
        let err = FieldExtractor::default().extract(&frame, Side::Left).unwrap_err();
        assert_eq!(err, Error::NoCandidate { min_area: 10000.0 });
    }

    #[test]
    fn test_outline_becomes_boundary() {
        let extraction = FieldExtractor::default()
            .extract(&court(100, 200), Side::Left)
            .unwrap();

        let boundary = extraction.to_boundary(100.0).unwrap();
        assert!(boundary.contains(Point::new(300.0, 100.0)));
        assert!(!boundary.contains(Point::new(50.0, 100.0)));
    }

    #[test]
    fn test_right_outline_reaches_frame_edge() {
        let extraction = FieldExtractor::default()
            .extract(&court(100, 200), Side::Right)
            .unwrap();

        assert!(extraction.outline.len() >= 4);
        assert_eq!(extraction.outline.iter().map(|p| p.x).min(), Some(0));

        let boundary = extraction.to_boundary(0.0).unwrap();
        assert!(boundary.contains(Point::new(50.0, 100.0)));
        assert!(!boundary.contains(Point::new(300.0, 100.0)));
    }
}
