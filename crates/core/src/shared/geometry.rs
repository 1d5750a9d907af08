//! Value types for detected shapes.
//!
//! Contours are integer pixel polylines; fitted shapes carry sub-pixel
//! centers and sizes in the same coordinate frame as the contour they were
//! fitted to.

use std::f64::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Ordered closed polyline of pixel coordinates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn to_imageproc(&self) -> Vec<imageproc::point::Point<i32>> {
        self.points
            .iter()
            .map(|p| imageproc::point::Point::new(p.x, p.y))
            .collect()
    }

    /// Enclosed area, always non-negative.
    pub fn area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        imageproc::geometry::contour_area(&self.to_imageproc()).abs()
    }

    /// Total length of the polyline, including the closing edge when `closed`.
    pub fn arc_length(&self, closed: bool) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        imageproc::geometry::arc_length(&self.to_imageproc(), closed)
    }

    /// Convex hull of the distinct vertices.
    pub fn convex_hull(&self) -> Polygon {
        let mut pts = self.points.clone();
        pts.sort();
        pts.dedup();
        if pts.len() < 3 {
            return Polygon::new(pts);
        }
        let hull = imageproc::geometry::convex_hull(Polygon::new(pts).to_imageproc().as_slice());
        Polygon::new(hull.into_iter().map(|p| Point::new(p.x, p.y)).collect())
    }

    /// Returns the polygon shifted by `(dx, dy)`.
    pub fn translated(&self, dx: i32, dy: i32) -> Polygon {
        Polygon::new(
            self.points
                .iter()
                .map(|p| Point::new(p.x + dx, p.y + dy))
                .collect(),
        )
    }

    /// Mean of the vertices.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let sx: f64 = self.points.iter().map(|p| p.x as f64).sum();
        let sy: f64 = self.points.iter().map(|p| p.y as f64).sum();
        Some((sx / n, sy / n))
    }
}

/// Circularity as `perimeter² / (4π·area)`.
///
/// A perfect circle scores 1.0; larger values are less circular.
pub fn circularity(perimeter: f64, area: f64) -> f64 {
    if area <= 0.0 {
        return f64::INFINITY;
    }
    perimeter * perimeter / (4.0 * PI * area)
}

/// Ellipse with full axis lengths and rotation in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipse {
    pub center: (f64, f64),
    /// Full lengths (diameters) along the rotated x and y axes.
    pub axes: (f64, f64),
    pub angle: f64,
}

impl Ellipse {
    /// Samples `n` points along the boundary.
    pub fn boundary_points(&self, n: usize) -> Vec<(f64, f64)> {
        let (cx, cy) = self.center;
        let (a, b) = (self.axes.0 / 2.0, self.axes.1 / 2.0);
        let (sin, cos) = self.angle.to_radians().sin_cos();
        (0..n)
            .map(|i| {
                let t = 2.0 * PI * i as f64 / n as f64;
                let (x, y) = (a * t.cos(), b * t.sin());
                (cx + x * cos - y * sin, cy + x * sin + y * cos)
            })
            .collect()
    }
}

/// Rotated rectangle with rotation in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotatedRect {
    pub center: (f64, f64),
    pub width: f64,
    pub height: f64,
    pub angle: f64,
}

impl RotatedRect {
    /// Corner points in drawing order.
    pub fn corners(&self) -> [(f64, f64); 4] {
        let (cx, cy) = self.center;
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        let corner = |u: f64, v: f64| (cx + u * cos - v * sin, cy + u * sin + v * cos);
        [
            corner(-hw, -hh),
            corner(hw, -hh),
            corner(hw, hh),
            corner(-hw, hh),
        ]
    }

    /// Height over width; infinite for a degenerate zero-width rectangle.
    pub fn aspect(&self) -> f64 {
        if self.width <= 0.0 {
            return f64::INFINITY;
        }
        self.height / self.width
    }
}
