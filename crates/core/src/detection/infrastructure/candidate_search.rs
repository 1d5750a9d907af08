//! Contour search and geometric filtering for pupil and reflection candidates.
//!
//! Both searches work on a preprocessed (cropped, blurred, grayscale) image
//! and return candidates already translated into full-frame coordinates.

use crate::detection::domain::candidate::{PupilCandidate, ReflectionCandidate};
use crate::detection::domain::tracker_config::{PupilParams, ReflectionParams};
use crate::shared::geometry::{circularity, Polygon};
use crate::shared::roi::Roi;

use super::contours;
use super::preprocess::Preprocessed;
use super::shape_fitting;

/// Minimum hull size for an ellipse fit.
const MIN_HULL_POINTS: usize = 5;

/// Dark, roughly circular blobs of plausible pupil size, in contour
/// discovery order.
pub fn search_pupils(pre: &Preprocessed, params: &PupilParams) -> Vec<PupilCandidate> {
    if pre.is_empty() {
        return Vec::new();
    }
    let binary = contours::binarize(&pre.gray, params.threshold);
    let closed = contours::close(&binary, params.close_iterations);
    let (dx, dy) = pre.offset;

    contours::extract_contours(&closed)
        .iter()
        .filter_map(|contour| accept_pupil(contour, params))
        .map(|c| PupilCandidate {
            hull: c.hull.translated(dx, dy),
            ..c
        })
        .collect()
}

fn accept_pupil(contour: &Polygon, params: &PupilParams) -> Option<PupilCandidate> {
    let area = contour.area();
    if area == 0.0 || !(params.min_area < area && area < params.max_area) {
        return None;
    }

    let hull = contour.convex_hull();
    if hull.len() < MIN_HULL_POINTS {
        return None;
    }

    let score = circularity(hull.arc_length(true), area);
    if score >= params.max_circularity {
        return None;
    }

    Some(PupilCandidate {
        hull,
        area,
        circularity: score,
    })
}

/// Bright, near-square highlights of plausible reflection size, in contour
/// discovery order.
///
/// With `containment`, a candidate is kept only if its rectangle center,
/// truncated to whole pixels, lies strictly inside that ROI.
pub fn search_reflections(
    pre: &Preprocessed,
    params: &ReflectionParams,
    containment: Option<Roi>,
) -> Vec<ReflectionCandidate> {
    if pre.is_empty() {
        return Vec::new();
    }
    let binary = contours::binarize(&pre.gray, params.threshold);
    let closed = contours::close(&binary, params.close_iterations);
    let (dx, dy) = pre.offset;

    contours::extract_contours(&closed)
        .iter()
        .filter_map(|contour| {
            let area = contour.area();
            if area == 0.0 || !(params.min_area < area && area < params.max_area) {
                return None;
            }

            let contour = contour.translated(dx, dy);
            let rect = shape_fitting::min_area_rect(&contour)?;
            let aspect = rect.aspect();
            if !(params.min_aspect < aspect && aspect < params.max_aspect) {
                return None;
            }

            if let Some(roi) = containment {
                let (cx, cy) = (rect.center.0 as i32, rect.center.1 as i32);
                if !roi.contains_strict(cx, cy) {
                    return None;
                }
            }

            Some(ReflectionCandidate {
                contour,
                area,
                rect,
            })
        })
        .collect()
}
