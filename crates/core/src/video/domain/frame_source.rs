use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

#[derive(Error, Debug)]
pub enum SourceError {
    /// The last frame was already read. The source has rewound to frame 0.
    #[error("end of stream")]
    EndOfStream,
    #[error("no source opened")]
    NoSource,
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Yields raw frames of a video in order.
///
/// Implementations decode at the I/O boundary and hand out full-resolution
/// BGR frames; downsampling is the tracker's concern.
pub trait FrameSource: Send {
    /// Opens `path` and positions the source at frame 0.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, SourceError>;

    /// Returns the frame at the current position and advances.
    ///
    /// After the last frame this rewinds to frame 0 and fails with
    /// [`SourceError::EndOfStream`]; the following call yields frame 0 again.
    /// Fails with [`SourceError::NoSource`] before a successful `open`.
    fn read_next(&mut self) -> Result<Frame, SourceError>;

    /// Number of frames reported by the container; 0 before `open`.
    fn frame_count(&self) -> usize;

    /// Index of the frame the next `read_next` returns.
    fn position(&self) -> usize;

    /// Moves so that the next `read_next` returns frame `index`.
    fn seek(&mut self, index: usize) -> Result<(), SourceError>;
}
