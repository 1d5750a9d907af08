use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::{FrameSource, SourceError};

/// Serves pre-decoded frames, for synthetic clips and tests.
///
/// Behaves like a video file: nothing can be read until `open`, and reading
/// past the last frame rewinds and reports end of stream.
pub struct MemorySource {
    frames: Vec<Frame>,
    fps: f64,
    position: usize,
    opened: bool,
}

impl MemorySource {
    pub fn new(frames: Vec<Frame>, fps: f64) -> Self {
        Self {
            frames,
            fps,
            position: 0,
            opened: false,
        }
    }
}

impl FrameSource for MemorySource {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, SourceError> {
        let first = self.frames.first().ok_or_else(|| SourceError::Open {
            path: path.to_path_buf(),
            source: "clip has no frames".into(),
        })?;
        let metadata = VideoMetadata {
            width: first.width(),
            height: first.height(),
            fps: self.fps,
            total_frames: self.frames.len(),
            source_path: Some(path.to_path_buf()),
        };
        self.opened = true;
        self.position = 0;
        Ok(metadata)
    }

    fn read_next(&mut self) -> Result<Frame, SourceError> {
        if !self.opened {
            return Err(SourceError::NoSource);
        }
        match self.frames.get(self.position) {
            Some(frame) => {
                self.position += 1;
                Ok(frame.clone())
            }
            None => {
                self.position = 0;
                Err(SourceError::EndOfStream)
            }
        }
    }

    fn frame_count(&self) -> usize {
        if self.opened {
            self.frames.len()
        } else {
            0
        }
    }

    fn position(&self) -> usize {
        self.position
    }

    fn seek(&mut self, index: usize) -> Result<(), SourceError> {
        if !self.opened {
            return Err(SourceError::NoSource);
        }
        if index >= self.frames.len() {
            self.position = 0;
            return Err(SourceError::EndOfStream);
        }
        self.position = index;
        Ok(())
    }
}
