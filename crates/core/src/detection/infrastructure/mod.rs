pub mod candidate_search;
pub mod contours;
pub(crate) mod gaussian;
pub mod preprocess;
pub mod pupil_tracker;
pub mod shape_fitting;
