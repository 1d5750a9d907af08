use crate::detection::domain::candidate::{PupilSelection, ReflectionSelection};
use crate::detection::domain::tracking_error::TrackingError;

use super::player::{PlaybackError, Player};

/// Manual candidate selection: each request steps to the next candidate and
/// wraps to the first once the list is exhausted.
///
/// Every selection starts from the pristine frame, so at most one pupil and
/// one reflection are annotated at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CandidateCycler {
    pupil_index: Option<usize>,
    reflection_index: Option<usize>,
    verbose: bool,
}

impl CandidateCycler {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            ..Self::default()
        }
    }

    pub fn pupil_index(&self) -> Option<usize> {
        self.pupil_index
    }

    pub fn reflection_index(&self) -> Option<usize> {
        self.reflection_index
    }

    pub fn reset_indices(&mut self) {
        self.pupil_index = None;
        self.reflection_index = None;
    }

    /// Selects the pupil after the current one.
    pub fn find_pupil(&mut self, player: &mut Player) -> Result<PupilSelection, PlaybackError> {
        let next = self.pupil_index.map_or(0, |i| i + 1);
        self.select_pupil(player, next)
    }

    /// Selects pupil candidate `index`, or the first one if `index` is past
    /// the end.
    pub fn select_pupil(
        &mut self,
        player: &mut Player,
        index: usize,
    ) -> Result<PupilSelection, PlaybackError> {
        let verbose = self.verbose;
        let tracker = player.tracker_mut();
        tracker.reset()?;

        let (selection, index) = match tracker.draw_pupil(index, None, verbose) {
            Err(TrackingError::IndexOutOfRange { .. }) if index > 0 => {
                (tracker.draw_pupil(0, None, verbose)?, 0)
            }
            other => (other?, index),
        };
        log::info!("Selected pupil {index} at {:?}", selection.centroid);

        self.pupil_index = Some(index);
        player.present()?;
        Ok(selection)
    }

    /// Selects the reflection after the current one.
    pub fn find_reflection(
        &mut self,
        player: &mut Player,
    ) -> Result<ReflectionSelection, PlaybackError> {
        let next = self.reflection_index.map_or(0, |i| i + 1);
        self.select_reflection(player, next)
    }

    /// Selects reflection candidate `index` (wrapping like
    /// [`select_pupil`](Self::select_pupil)). The selected pupil, if any, is
    /// drawn again first so the search is confined to its ROI.
    pub fn select_reflection(
        &mut self,
        player: &mut Player,
        index: usize,
    ) -> Result<ReflectionSelection, PlaybackError> {
        let verbose = self.verbose;
        let tracker = player.tracker_mut();
        tracker.reset()?;
        if let Some(pupil) = self.pupil_index {
            tracker.draw_pupil(pupil, None, verbose)?;
        }

        let (selection, index) = match tracker.draw_reflection(index, None, verbose) {
            Err(TrackingError::IndexOutOfRange { .. }) if index > 0 => {
                (tracker.draw_reflection(0, None, verbose)?, 0)
            }
            other => (other?, index),
        };
        log::info!("Selected reflection {index} at {:?}", selection.centroid);

        self.reflection_index = Some(index);
        player.present()?;
        Ok(selection)
    }

    /// Drops all annotations and selections.
    pub fn clear(&mut self, player: &mut Player) -> Result<(), PlaybackError> {
        player.tracker_mut().reset()?;
        self.reset_indices();
        player.present()
    }
}
