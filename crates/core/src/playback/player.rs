use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::detection::domain::candidate::{PupilSelection, ReflectionSelection};
use crate::detection::domain::tracking_error::TrackingError;
use crate::detection::infrastructure::pupil_tracker::PupilTracker;
use crate::shared::constants::DEFAULT_FPS;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::display_surface::DisplaySurface;
use crate::video::domain::frame_source::{FrameSource, SourceError};

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Tracking(#[from] TrackingError),
    #[error("display failed: {0}")]
    Display(#[source] Box<dyn std::error::Error>),
}

impl PlaybackError {
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, PlaybackError::Source(SourceError::EndOfStream))
    }
}

/// What one running tick produced.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedFrame {
    pub index: usize,
    pub pupil: Option<PupilSelection>,
    pub reflection: Option<ReflectionSelection>,
}

/// Drives a [`PupilTracker`] from a [`FrameSource`] at a fixed cadence and
/// hands each annotated frame to a [`DisplaySurface`].
pub struct Player {
    tracker: PupilTracker,
    source: Box<dyn FrameSource>,
    display: Box<dyn DisplaySurface>,
    fps: u32,
    running: bool,
    position: usize,
    frame_count: usize,
}

impl Player {
    pub fn new(
        tracker: PupilTracker,
        source: Box<dyn FrameSource>,
        display: Box<dyn DisplaySurface>,
    ) -> Self {
        Self {
            tracker,
            source,
            display,
            fps: DEFAULT_FPS,
            running: false,
            position: 0,
            frame_count: 0,
        }
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    /// Opens a video, shows its first frame with no tracking state and
    /// leaves playback stopped at frame 0.
    pub fn open(&mut self, path: &Path) -> Result<VideoMetadata, PlaybackError> {
        self.running = false;
        let metadata = self.source.open(path)?;
        self.frame_count = self.source.frame_count();
        self.reload_first_frame()?;
        log::info!(
            "Loaded {} ({} frames at {} fps playback)",
            path.display(),
            self.frame_count,
            self.fps
        );
        Ok(metadata)
    }

    pub fn start(&mut self) {
        if !self.running {
            log::debug!("Playback started at frame {}", self.position);
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        if self.running {
            log::debug!("Playback stopped at frame {}", self.position);
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps as f64)
    }

    /// Index of the frame currently shown.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn tracker(&self) -> &PupilTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut PupilTracker {
        &mut self.tracker
    }

    /// One timer tick.
    ///
    /// While running: reads the next frame, tracks the pupil and then the
    /// reflection, and presents the result. At end of stream the first frame
    /// is reloaded with tracking state cleared, playback stops and
    /// `EndOfStream` is returned. Without a source playback stops and
    /// `NoSource` is returned. While stopped the current frame is presented
    /// again and `Ok(None)` is returned.
    pub fn tick(&mut self) -> Result<Option<TrackedFrame>, PlaybackError> {
        if !self.running {
            self.present()?;
            return Ok(None);
        }

        let frame = match self.source.read_next() {
            Ok(frame) => frame,
            Err(SourceError::EndOfStream) => {
                log::info!("End of stream, rewound to first frame");
                self.running = false;
                self.reload_first_frame()?;
                return Err(SourceError::EndOfStream.into());
            }
            Err(e) => {
                self.running = false;
                return Err(e.into());
            }
        };

        self.position = frame.index();
        self.tracker.advance(&frame);
        let pupil = self.tracker.track_pupil()?;
        let reflection = self.tracker.track_reflection()?;
        log::debug!(
            "Frame {}: pupil {:?}, reflection {:?}",
            self.position,
            pupil.as_ref().map(|p| p.centroid),
            reflection.as_ref().map(|r| r.centroid)
        );
        self.present()?;

        Ok(Some(TrackedFrame {
            index: self.position,
            pupil,
            reflection,
        }))
    }

    /// Hands the tracker's current frame to the display, if there is one.
    pub fn present(&mut self) -> Result<(), PlaybackError> {
        match self.tracker.frame() {
            Some(frame) => self.display.present(frame).map_err(PlaybackError::Display),
            None => Ok(()),
        }
    }

    /// Expects the source at frame 0; leaves it there.
    fn reload_first_frame(&mut self) -> Result<(), PlaybackError> {
        let first = self.source.read_next()?;
        self.tracker.load(&first);
        self.source.seek(0)?;
        self.position = 0;
        self.present()
    }
}
