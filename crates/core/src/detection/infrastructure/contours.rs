use image::{GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::morphology;

use crate::shared::geometry::{Point, Polygon};

/// Pixels strictly above `threshold` become 255, the rest 0.
pub fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Morphological close with a 3×3 square element applied `iterations` times.
///
/// `k` dilations followed by `k` erosions under the chessboard norm are the
/// same as iterating a 3×3 all-ones element `k` times.
pub fn close(binary: &GrayImage, iterations: u8) -> GrayImage {
    if iterations == 0 {
        return binary.clone();
    }
    morphology::close(binary, Norm::LInf, iterations)
}

/// Every border in the binary image, outer borders and hole borders alike,
/// in discovery order. Straight runs are collapsed to their end points.
pub fn extract_contours(binary: &GrayImage) -> Vec<Polygon> {
    if binary.width() == 0 || binary.height() == 0 {
        return Vec::new();
    }
    find_contours::<i32>(binary)
        .into_iter()
        .map(|c| {
            let points: Vec<Point> = c.points.iter().map(|p| Point::new(p.x, p.y)).collect();
            Polygon::new(collapse_straight_runs(&points))
        })
        .collect()
}

/// Drops every point whose incoming and outgoing chain steps are equal, so
/// horizontal, vertical and diagonal runs keep only their end points.
pub fn collapse_straight_runs(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let kept: Vec<Point> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            (cur.x - prev.x, cur.y - prev.y) != (next.x - cur.x, next.y - cur.y)
        })
        .map(|i| points[i])
        .collect();
    if kept.is_empty() {
        // A closed chain cannot be straight everywhere; keep it untouched.
        return points.to_vec();
    }
    kept
}
