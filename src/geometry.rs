//! Contour geometry and the field region-of-interest filter

use crate::error::{Precondition, Result};
use image::{imageops, GrayImage};
use imageproc::contours::{self, find_contours, BorderType};
use imageproc::point::Point;

/// Closed pixel chain traced around a connected region of a binary mask
pub type Contour = Vec<Point<i32>>;

/// Court boundary for the reference wide-angle setup (1920x1080 frames)
pub const DEFAULT_FIELD: [(f64, f64); 4] = [
    (520.0, 310.0),
    (1400.0, 310.0),
    (1780.0, 1000.0),
    (140.0, 1000.0),
];

/// Margin the field polygon is grown by before intersection tests
pub const FIELD_MARGIN: f64 = 100.0;

/// Axis-aligned box in pixel coordinates, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box covering every point, pixel extents inclusive
    ///
    /// Returns `None` for an empty point list.
    pub fn of(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);

        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Some(Self {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Area enclosed by a contour, treated as a closed polygon (shoelace formula)
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();

    twice_area.abs() as f64 / 2.0
}

/// Trace every border of a mask, in mask coordinates
///
/// The mask is traced inside a 1 px zero frame so regions touching the image
/// edge still come back as outer borders.
fn trace(mask: &GrayImage) -> Vec<contours::Contour<i32>> {
    let (width, height) = mask.dimensions();
    let mut padded = GrayImage::new(width + 2, height + 2);
    imageops::replace(&mut padded, mask, 1, 1);

    let mut traced = find_contours::<i32>(&padded);
    for contour in &mut traced {
        for p in &mut contour.points {
            *p = Point::new(p.x - 1, p.y - 1);
        }
    }
    traced
}

/// Outermost outer borders of the non-zero regions of a mask
///
/// Holes and regions nested inside holes are dropped.
pub fn external_contours(mask: &GrayImage) -> Vec<Contour> {
    trace(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points)
        .collect()
}

/// Every border (outer and hole) of the non-zero regions of a mask
pub fn all_contours(mask: &GrayImage) -> Vec<Contour> {
    trace(mask).into_iter().map(|c| c.points).collect()
}

/// Known playing-field polygon, grown by a constant margin
///
/// Membership in the grown region is evaluated analytically: a point lies in
/// it when it is inside the polygon or within `margin` of one of its edges.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBoundary {
    vertices: Vec<Point<f64>>,
    margin: f64,
}

impl Default for FieldBoundary {
    fn default() -> Self {
        Self {
            vertices: DEFAULT_FIELD
                .iter()
                .map(|&(x, y)| Point::new(x, y))
                .collect(),
            margin: FIELD_MARGIN,
        }
    }
}

impl FieldBoundary {
    pub fn new(vertices: Vec<Point<f64>>, margin: f64) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(Precondition::DegenerateBoundary(vertices.len()).into());
        }

        Ok(Self {
            vertices,
            margin: margin.max(0.0),
        })
    }

    pub fn vertices(&self) -> &[Point<f64>] {
        &self.vertices
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    fn edges(&self) -> impl Iterator<Item = (Point<f64>, Point<f64>)> + '_ {
        self.vertices
            .iter()
            .copied()
            .zip(self.vertices.iter().copied().cycle().skip(1))
    }

    /// Even-odd point-in-polygon test against the unbuffered polygon
    pub fn contains(&self, p: Point<f64>) -> bool {
        let mut inside = false;

        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }

        inside
    }

    /// Distance from a point to the filled polygon (0 inside)
    pub fn distance_to(&self, p: Point<f64>) -> f64 {
        if self.contains(p) {
            return 0.0;
        }

        self.edges()
            .map(|(a, b)| point_segment_distance(p, a, b))
            .fold(f64::INFINITY, f64::min)
    }

    /// Whether the closed polyline touches the grown field region
    pub fn intersects_polyline(&self, points: &[Point<i32>]) -> bool {
        let points: Vec<Point<f64>> = points
            .iter()
            .map(|p| Point::new(p.x as f64, p.y as f64))
            .collect();

        let Some(&first) = points.first() else {
            return false;
        };

        if points.iter().any(|&p| self.contains(p)) {
            return true;
        }

        if points.len() == 1 {
            return self.distance_to(first) <= self.margin;
        }

        points
            .iter()
            .copied()
            .zip(points.iter().copied().cycle().skip(1))
            .any(|(p, q)| {
                self.edges()
                    .any(|(a, b)| segment_distance(p, q, a, b) <= self.margin)
            })
    }
}

/// Drops contours that are too small or lie away from the field
#[derive(Debug, Clone, Default)]
pub struct GeometryFilter {
    boundary: FieldBoundary,
}

impl GeometryFilter {
    pub fn new(boundary: FieldBoundary) -> Self {
        Self { boundary }
    }

    pub fn boundary(&self) -> &FieldBoundary {
        &self.boundary
    }

    /// Keep contours with area >= `min_area` touching the grown field, in order
    pub fn filter(&self, contours: Vec<Contour>, min_area: f64) -> Vec<Contour> {
        contours
            .into_iter()
            .filter(|c| contour_area(c) >= min_area)
            .filter(|c| self.boundary.intersects_polyline(c))
            .collect()
    }
}

fn cross(o: Point<f64>, a: Point<f64>, b: Point<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn point_segment_distance(p: Point<f64>, a: Point<f64>, b: Point<f64>) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;

    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };

    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

fn on_segment(p: Point<f64>, a: Point<f64>, b: Point<f64>) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn segments_intersect(p: Point<f64>, q: Point<f64>, a: Point<f64>, b: Point<f64>) -> bool {
    let d1 = cross(a, b, p);
    let d2 = cross(a, b, q);
    let d3 = cross(p, q, a);
    let d4 = cross(p, q, b);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(p, a, b))
        || (d2 == 0.0 && on_segment(q, a, b))
        || (d3 == 0.0 && on_segment(a, p, q))
        || (d4 == 0.0 && on_segment(b, p, q))
}

fn segment_distance(p: Point<f64>, q: Point<f64>, a: Point<f64>, b: Point<f64>) -> f64 {
    if segments_intersect(p, q, a, b) {
        return 0.0;
    }

    point_segment_distance(p, a, b)
        .min(point_segment_distance(q, a, b))
        .min(point_segment_distance(a, p, q))
        .min(point_segment_distance(b, p, q))
}
