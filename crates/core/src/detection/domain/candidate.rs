use crate::shared::geometry::{Ellipse, Polygon, RotatedRect};
use crate::shared::roi::Roi;

/// A pupil candidate: convex hull of a dark blob, in full-frame coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct PupilCandidate {
    pub hull: Polygon,
    /// Area of the source contour (not of the hull).
    pub area: f64,
    pub circularity: f64,
}

/// A reflection candidate: contour of a bright highlight and its
/// minimum-area rectangle, both in full-frame coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct ReflectionCandidate {
    pub contour: Polygon,
    pub area: f64,
    pub rect: RotatedRect,
}

/// Result of selecting and drawing a pupil candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct PupilSelection {
    pub candidate: PupilCandidate,
    pub ellipse: Ellipse,
    pub centroid: (i32, i32),
    pub roi: Roi,
}

/// Result of selecting and drawing a reflection candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct ReflectionSelection {
    pub candidate: ReflectionCandidate,
    pub centroid: (i32, i32),
    pub roi: Roi,
}

/// Tracking state of one shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackState {
    /// No candidate confirmed since the last load or reset.
    Unconfirmed,
    /// Following the shape inside this ROI.
    Tracking(Roi),
}

impl From<Option<Roi>> for TrackState {
    fn from(roi: Option<Roi>) -> Self {
        match roi {
            Some(r) => TrackState::Tracking(r),
            None => TrackState::Unconfirmed,
        }
    }
}
