use crate::annotation::overlay;
use crate::detection::domain::candidate::{
    PupilCandidate, PupilSelection, ReflectionCandidate, ReflectionSelection, TrackState,
};
use crate::detection::domain::tracker_config::TrackerConfig;
use crate::detection::domain::tracking_error::{Shape, TrackingError};
use crate::shared::frame::Frame;
use crate::shared::roi::Roi;

use super::candidate_search;
use super::gaussian;
use super::preprocess::preprocess;
use super::shape_fitting;

/// Stateful pupil and corneal-reflection tracker.
///
/// Holds the current (annotated) frame, a pristine copy of it, and one ROI
/// slot per shape. A successful draw moves a shape into tracking; a failed
/// tracking update keeps the stale ROI. Only [`load`](Self::load),
/// [`reset`](Self::reset) and [`clear_rois`](Self::clear_rois) drop back to
/// unconfirmed.
pub struct PupilTracker {
    config: TrackerConfig,
    frame: Option<Frame>,
    original: Option<Frame>,
    pupil_roi: Option<Roi>,
    reflection_roi: Option<Roi>,
}

impl Default for PupilTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl PupilTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            frame: None,
            original: None,
            pupil_roi: None,
            reflection_roi: None,
        }
    }

    /// Ingests a fresh frame and forgets both ROIs.
    pub fn load(&mut self, frame: &Frame) {
        self.ingest(frame);
        self.clear_rois();
    }

    /// Ingests the next playback frame, keeping both ROIs so tracking
    /// carries over.
    pub fn advance(&mut self, frame: &Frame) {
        self.ingest(frame);
    }

    fn ingest(&mut self, frame: &Frame) {
        let scale = self.config.downscale.max(1);
        let (data, w, h) = gaussian::downscale(
            frame.data(),
            frame.width() as usize,
            frame.height() as usize,
            frame.channels() as usize,
            scale,
        );
        let small = Frame::new(data, w as u32, h as u32, frame.channels(), frame.index());
        self.original = Some(small.clone());
        self.frame = Some(small);
    }

    /// Discards annotations by restoring the pristine copy, and forgets both
    /// ROIs.
    pub fn reset(&mut self) -> Result<(), TrackingError> {
        let original = self.original.as_ref().ok_or(TrackingError::NothingToReset)?;
        self.frame = Some(original.clone());
        self.clear_rois();
        Ok(())
    }

    pub fn clear_rois(&mut self) {
        self.pupil_roi = None;
        self.reflection_roi = None;
    }

    /// Current frame, including any annotations drawn since it was ingested.
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn original_frame(&self) -> Option<&Frame> {
        self.original.as_ref()
    }

    pub fn pupil_roi(&self) -> Option<Roi> {
        self.pupil_roi
    }

    pub fn reflection_roi(&self) -> Option<Roi> {
        self.reflection_roi
    }

    pub fn pupil_state(&self) -> TrackState {
        self.pupil_roi.into()
    }

    pub fn reflection_state(&self) -> TrackState {
        self.reflection_roi.into()
    }

    fn current(&self) -> Result<&Frame, TrackingError> {
        self.frame.as_ref().ok_or(TrackingError::NoFrameLoaded)
    }

    /// Pupil candidates in the current frame, or inside `roi` when given.
    pub fn find_pupils(&self, roi: Option<Roi>) -> Result<Vec<PupilCandidate>, TrackingError> {
        let pre = preprocess(self.current()?, roi);
        let found = candidate_search::search_pupils(&pre, &self.config.pupil);
        log::debug!("{} pupil candidate(s) in {:?}", found.len(), roi);
        Ok(found)
    }

    /// Selects pupil candidate `index`, annotates the current frame with it
    /// and re-centers the pupil ROI on its centroid.
    pub fn draw_pupil(
        &mut self,
        index: usize,
        roi: Option<Roi>,
        verbose: bool,
    ) -> Result<PupilSelection, TrackingError> {
        let candidates = self.find_pupils(roi)?;
        let candidate = pick(candidates, index, Shape::Pupil)?;
        let ellipse = shape_fitting::fit_ellipse(&candidate.hull)
            .ok_or(TrackingError::NoCandidateFound(Shape::Pupil))?;

        let centroid = (ellipse.center.0 as i32, ellipse.center.1 as i32);
        let selection = PupilSelection {
            candidate,
            ellipse,
            centroid,
            roi: Roi::centered_square(centroid.0, centroid.1, self.config.pupil.roi_size),
        };

        let frame = self.frame.as_mut().ok_or(TrackingError::NoFrameLoaded)?;
        overlay::draw_pupil(frame, &selection, verbose);
        self.pupil_roi = Some(selection.roi);
        Ok(selection)
    }

    /// Follows the pupil inside its ROI. `Ok(None)` when unconfirmed or when
    /// no candidate was found this frame; the ROI is then left as it was.
    pub fn track_pupil(&mut self) -> Result<Option<PupilSelection>, TrackingError> {
        let Some(roi) = self.pupil_roi else {
            return Ok(None);
        };
        match self.draw_pupil(0, Some(roi), true) {
            Ok(selection) => Ok(Some(selection)),
            Err(e) if e.is_tracking_miss() => {
                log::trace!("Pupil tracking miss: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Reflection candidates inside the pupil ROI (whole frame when the
    /// pupil is unconfirmed). `containment`, when given, keeps only
    /// candidates centered strictly inside it.
    pub fn find_reflections(
        &self,
        containment: Option<Roi>,
    ) -> Result<Vec<ReflectionCandidate>, TrackingError> {
        let pre = preprocess(self.current()?, self.pupil_roi);
        let found =
            candidate_search::search_reflections(&pre, &self.config.reflection, containment);
        log::debug!(
            "{} reflection candidate(s) in {:?} within {:?}",
            found.len(),
            self.pupil_roi,
            containment
        );
        Ok(found)
    }

    /// Selects reflection candidate `index`, annotates the current frame with
    /// it and re-centers the reflection ROI on its rectangle center.
    pub fn draw_reflection(
        &mut self,
        index: usize,
        containment: Option<Roi>,
        verbose: bool,
    ) -> Result<ReflectionSelection, TrackingError> {
        let candidates = self.find_reflections(containment)?;
        let candidate = pick(candidates, index, Shape::Reflection)?;

        let centroid = (candidate.rect.center.0 as i32, candidate.rect.center.1 as i32);
        let roi = Roi::centered_square(centroid.0, centroid.1, self.config.reflection.roi_size);
        let selection = ReflectionSelection {
            candidate,
            centroid,
            roi,
        };

        let frame = self.frame.as_mut().ok_or(TrackingError::NoFrameLoaded)?;
        overlay::draw_reflection(frame, &selection, verbose);
        self.reflection_roi = Some(selection.roi);
        Ok(selection)
    }

    pub fn track_reflection(&mut self) -> Result<Option<ReflectionSelection>, TrackingError> {
        let Some(roi) = self.reflection_roi else {
            return Ok(None);
        };
        match self.draw_reflection(0, Some(roi), true) {
            Ok(selection) => Ok(Some(selection)),
            Err(e) if e.is_tracking_miss() => {
                log::trace!("Reflection tracking miss: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn pick<T>(candidates: Vec<T>, index: usize, shape: Shape) -> Result<T, TrackingError> {
    if candidates.is_empty() {
        return Err(TrackingError::NoCandidateFound(shape));
    }
    let len = candidates.len();
    candidates
        .into_iter()
        .nth(index)
        .ok_or(TrackingError::IndexOutOfRange { shape, index, len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SKIN: [u8; 3] = [150, 150, 150];
    const PUPIL: [u8; 3] = [20, 20, 20];
    const GLINT: [u8; 3] = [250, 250, 250];

    /// Full-resolution eye image: dark disks `(cx, cy, r)` with bright
    /// squares `(x, y, side)` painted on top.
    fn eye_frame(pupils: &[(i32, i32, i32)], glints: &[(i32, i32, i32)]) -> Frame {
        let (w, h) = (640u32, 480u32);
        let mut frame = Frame::filled(w, h, SKIN, 0);
        {
            let mut arr = frame.as_ndarray_mut();
            for y in 0..h as i32 {
                for x in 0..w as i32 {
                    let color = if glints.iter().any(|&(gx, gy, s)| {
                        (gx..gx + s).contains(&x) && (gy..gy + s).contains(&y)
                    }) {
                        Some(GLINT)
                    } else if pupils
                        .iter()
                        .any(|&(cx, cy, r)| (x - cx).pow(2) + (y - cy).pow(2) <= r * r)
                    {
                        Some(PUPIL)
                    } else {
                        None
                    };
                    if let Some(c) = color {
                        for ch in 0..3 {
                            arr[[y as usize, x as usize, ch]] = c[ch];
                        }
                    }
                }
            }
        }
        frame
    }

    fn single_eye() -> Frame {
        // Half-scale: pupil r=30 at (160,120), glint 10×10 at (170..180, 105..115)
        eye_frame(&[(320, 240, 60)], &[(340, 210, 20)])
    }

    #[test]
    fn test_load_downsamples_and_keeps_pristine_copy() {
        let mut tracker = PupilTracker::default();
        tracker.load(&Frame::filled(641, 481, SKIN, 3));
        let frame = tracker.frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (320, 240));
        assert_eq!(frame.index(), 3);
        assert_eq!(tracker.original_frame(), Some(frame));
        assert_eq!(tracker.pupil_state(), TrackState::Unconfirmed);
        assert_eq!(tracker.reflection_state(), TrackState::Unconfirmed);
    }

    #[test]
    fn test_operations_before_load_fail() {
        let mut tracker = PupilTracker::default();
        assert_eq!(tracker.reset(), Err(TrackingError::NothingToReset));
        assert_eq!(tracker.find_pupils(None), Err(TrackingError::NoFrameLoaded));
        assert_eq!(
            tracker.draw_reflection(0, None, true).unwrap_err(),
            TrackingError::NoFrameLoaded
        );
        // Unconfirmed tracking is a no-op even without a frame
        assert_eq!(tracker.track_pupil(), Ok(None));
    }

    #[test]
    fn test_draw_pupil_sets_exact_roi() {
        let mut tracker = PupilTracker::default();
        tracker.load(&single_eye());
        let selection = tracker.draw_pupil(0, None, true).unwrap();

        let (cx, cy) = selection.centroid;
        assert!((cx - 160).abs() <= 1, "cx {cx}");
        assert!((cy - 120).abs() <= 1, "cy {cy}");
        let roi = tracker.pupil_roi().unwrap();
        assert_eq!(roi, Roi::new((cx - 100, cy - 100), (cx + 100, cy + 100)));
        assert_eq!(tracker.pupil_state(), TrackState::Tracking(roi));
    }

    #[test]
    fn test_draw_pupil_annotates_only_current_frame() {
        let mut tracker = PupilTracker::default();
        tracker.load(&single_eye());
        tracker.draw_pupil(0, None, false).unwrap();
        assert_ne!(tracker.frame(), tracker.original_frame());
    }

    #[test]
    fn test_find_pupils_does_not_mutate_frame() {
        let mut tracker = PupilTracker::default();
        tracker.load(&single_eye());
        let before = tracker.frame().cloned();
        let found = tracker.find_pupils(None).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(tracker.frame().cloned(), before);
    }

    #[test]
    fn test_empty_frame_has_no_candidate() {
        let mut tracker = PupilTracker::default();
        tracker.load(&Frame::filled(640, 480, SKIN, 0));
        assert_eq!(
            tracker.draw_pupil(0, None, true).unwrap_err(),
            TrackingError::NoCandidateFound(Shape::Pupil)
        );
        assert_eq!(
            tracker.draw_reflection(0, None, true).unwrap_err(),
            TrackingError::NoCandidateFound(Shape::Reflection)
        );
        assert_eq!(tracker.pupil_roi(), None);
    }

    #[test]
    fn test_index_past_candidates_is_out_of_range() {
        let mut tracker = PupilTracker::default();
        tracker.load(&eye_frame(&[(160, 240, 60), (480, 240, 60)], &[]));
        assert_eq!(
            tracker.draw_pupil(5, None, true).unwrap_err(),
            TrackingError::IndexOutOfRange {
                shape: Shape::Pupil,
                index: 5,
                len: 2
            }
        );
        assert_eq!(tracker.pupil_roi(), None);
    }

    #[rstest]
    #[case::annotated(true)]
    #[case::quiet(false)]
    fn test_reset_is_idempotent(#[case] verbose: bool) {
        let mut tracker = PupilTracker::default();
        tracker.load(&single_eye());
        tracker.draw_pupil(0, None, verbose).unwrap();

        tracker.reset().unwrap();
        let once = (tracker.frame().cloned(), tracker.pupil_roi(), tracker.reflection_roi());
        tracker.reset().unwrap();
        let twice = (tracker.frame().cloned(), tracker.pupil_roi(), tracker.reflection_roi());

        assert_eq!(once, twice);
        assert_eq!(tracker.frame(), tracker.original_frame());
        assert_eq!(once.1, None);
    }

    #[test]
    fn test_draw_reflection_sets_exact_roi_inside_pupil() {
        let mut tracker = PupilTracker::default();
        tracker.load(&single_eye());
        tracker.draw_pupil(0, None, true).unwrap();
        let selection = tracker.draw_reflection(0, None, true).unwrap();

        let (cx, cy) = selection.centroid;
        assert!((cx - 174).abs() <= 1, "cx {cx}");
        assert!((cy - 109).abs() <= 1, "cy {cy}");
        assert_eq!(
            tracker.reflection_roi(),
            Some(Roi::new((cx - 15, cy - 15), (cx + 15, cy + 15)))
        );
    }

    #[test]
    fn test_reflection_containment_filter() {
        let mut tracker = PupilTracker::default();
        tracker.load(&single_eye());
        let far = Roi::centered_square(20, 20, 30);
        assert_eq!(
            tracker.draw_reflection(0, Some(far), true).unwrap_err(),
            TrackingError::NoCandidateFound(Shape::Reflection)
        );
    }

    #[test]
    fn test_track_pupil_follows_moving_pupil() {
        let mut tracker = PupilTracker::default();
        tracker.load(&eye_frame(&[(320, 240, 60)], &[]));
        tracker.draw_pupil(0, None, true).unwrap();

        tracker.advance(&eye_frame(&[(340, 260, 60)], &[]));
        let selection = tracker.track_pupil().unwrap().unwrap();
        let (cx, cy) = selection.centroid;
        assert!((cx - 170).abs() <= 1, "cx {cx}");
        assert!((cy - 130).abs() <= 1, "cy {cy}");
        assert_eq!(tracker.pupil_roi(), Some(Roi::centered_square(cx, cy, 200)));
    }

    #[test]
    fn test_failed_tracking_keeps_stale_roi() {
        let mut tracker = PupilTracker::default();
        tracker.load(&single_eye());
        tracker.draw_pupil(0, None, true).unwrap();
        tracker.draw_reflection(0, None, true).unwrap();
        let (pupil, reflection) = (tracker.pupil_roi(), tracker.reflection_roi());

        tracker.advance(&Frame::filled(640, 480, SKIN, 1));
        assert_eq!(tracker.track_pupil(), Ok(None));
        assert_eq!(tracker.track_reflection(), Ok(None));
        assert_eq!(tracker.pupil_roi(), pupil);
        assert_eq!(tracker.reflection_roi(), reflection);
    }

    #[test]
    fn test_load_clears_tracking_state() {
        let mut tracker = PupilTracker::default();
        tracker.load(&single_eye());
        tracker.draw_pupil(0, None, true).unwrap();
        tracker.load(&single_eye());
        assert_eq!(tracker.pupil_state(), TrackState::Unconfirmed);
    }

    #[test]
    fn test_custom_downscale() {
        let config = TrackerConfig {
            downscale: 4,
            ..TrackerConfig::default()
        };
        let mut tracker = PupilTracker::new(config);
        tracker.load(&Frame::filled(640, 480, SKIN, 0));
        let frame = tracker.frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (160, 120));
    }
}
