use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::video::domain::display_surface::DisplaySurface;

/// Writes presented frames to `frame_NNNNNN.png` in a directory using the
/// `image` crate, numbered by source frame index.
///
/// Presenting the same index again overwrites its file, so a frame that was
/// re-annotated before playback ends up with its last rendering. Frames
/// older than the newest one written are skipped; this keeps the rewind to
/// the first frame at end of stream from replacing the tracked frame 0.
pub struct ImageSequenceDisplay {
    dir: PathBuf,
    newest: Option<usize>,
}

impl ImageSequenceDisplay {
    pub fn new(dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            newest: None,
        })
    }

    fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }
}

impl DisplaySurface for ImageSequenceDisplay {
    fn present(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let index = frame.index();
        if self.newest.is_some_and(|newest| index < newest) {
            log::trace!("Skipping rewound frame {index}");
            return Ok(());
        }

        let rgb: Vec<u8> = frame
            .data()
            .chunks_exact(3)
            .flat_map(|bgr| [bgr[2], bgr[1], bgr[0]])
            .collect();
        let img = image::RgbImage::from_raw(frame.width(), frame.height(), rgb)
            .ok_or("Failed to create image from frame data")?;

        let path = self.path_for(index);
        img.save(&path)?;
        log::trace!("Wrote {}", path.display());
        self.newest = Some(index);
        Ok(())
    }
}
