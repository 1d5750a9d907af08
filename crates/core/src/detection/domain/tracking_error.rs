use std::fmt;

use thiserror::Error;

/// Which of the two tracked shapes an operation concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Pupil,
    Reflection,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Pupil => write!(f, "pupil"),
            Shape::Reflection => write!(f, "reflection"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingError {
    #[error("no frame loaded")]
    NoFrameLoaded,
    #[error("no {0} candidates found")]
    NoCandidateFound(Shape),
    #[error("{shape} candidate {index} requested but only {len} found")]
    IndexOutOfRange {
        shape: Shape,
        index: usize,
        len: usize,
    },
    #[error("nothing to reset to")]
    NothingToReset,
}

impl TrackingError {
    /// Misses that a per-frame tracking update absorbs instead of surfacing.
    pub fn is_tracking_miss(&self) -> bool {
        matches!(
            self,
            TrackingError::NoCandidateFound(_) | TrackingError::IndexOutOfRange { .. }
        )
    }
}
