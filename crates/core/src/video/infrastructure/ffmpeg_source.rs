use std::path::{Path, PathBuf};

use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::{FrameSource, SourceError};

/// Decodes video frames via ffmpeg-next (libavformat + libavcodec).
///
/// Each decoded frame is converted to BGR24. Rewinding and seeking reopen
/// the container and decode forward, which keeps frame positions exact
/// regardless of keyframe spacing.
pub struct FfmpegSource {
    path: Option<PathBuf>,
    decode: Option<DecodeState>,
    frame_count: usize,
    position: usize,
}

// Safety: FfmpegSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegSource {}

impl FfmpegSource {
    pub fn new() -> Self {
        Self {
            path: None,
            decode: None,
            frame_count: 0,
            position: 0,
        }
    }

    fn rewind(&mut self) -> Result<(), SourceError> {
        let path = self.path.clone().ok_or(SourceError::NoSource)?;
        let (state, _) =
            DecodeState::open(&path).map_err(|source| SourceError::Open { path, source })?;
        self.decode = Some(state);
        self.position = 0;
        Ok(())
    }
}

impl Default for FfmpegSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for FfmpegSource {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, SourceError> {
        let (state, metadata) = DecodeState::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!(
            "Opened {} ({}x{}, {:.2} fps, {} frames)",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames
        );

        self.path = Some(path.to_path_buf());
        self.decode = Some(state);
        self.frame_count = metadata.total_frames;
        self.position = 0;
        Ok(metadata)
    }

    fn read_next(&mut self) -> Result<Frame, SourceError> {
        let Some(state) = self.decode.as_mut() else {
            return Err(SourceError::NoSource);
        };
        let (width, height) = (state.width, state.height);
        let next = state
            .next_pixels()
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        match next {
            Some(pixels) => {
                let frame = Frame::new(pixels, width, height, 3, self.position);
                self.position += 1;
                Ok(frame)
            }
            None => {
                log::debug!("End of stream after {} frames, rewinding", self.position);
                self.rewind()?;
                Err(SourceError::EndOfStream)
            }
        }
    }

    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn position(&self) -> usize {
        self.position
    }

    fn seek(&mut self, index: usize) -> Result<(), SourceError> {
        self.rewind()?;
        let Some(state) = self.decode.as_mut() else {
            return Err(SourceError::NoSource);
        };
        for _ in 0..index {
            let skipped = state
                .next_pixels()
                .map_err(|e| SourceError::Decode(e.to_string()))?;
            if skipped.is_none() {
                self.rewind()?;
                return Err(SourceError::EndOfStream);
            }
        }
        self.position = index;
        Ok(())
    }
}

/// Demuxer, decoder and BGR converter for one pass over the video stream.
struct DecodeState {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    flushing: bool,
}

impl DecodeState {
    fn open(
        path: &Path,
    ) -> Result<(Self, VideoMetadata), Box<dyn std::error::Error + Send + Sync>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        let total_frames = stream.frames().max(0) as usize;

        let (width, height) = (decoder.width(), decoder.height());
        let scaler = scaling::Context::get(
            decoder.format(),
            width,
            height,
            Pixel::BGR24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )?;

        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames,
            source_path: Some(path.to_path_buf()),
        };
        let state = Self {
            ictx,
            decoder,
            scaler,
            stream_index,
            width,
            height,
            flushing: false,
        };
        Ok((state, metadata))
    }

    /// Tightly packed BGR pixels of the next frame, or `None` once the
    /// decoder is drained.
    fn next_pixels(&mut self) -> Result<Option<Vec<u8>>, ffmpeg_next::Error> {
        loop {
            let mut decoded = Video::empty();
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let mut bgr = Video::empty();
                self.scaler.run(&decoded, &mut bgr)?;
                return Ok(Some(extract_bgr_pixels(&bgr, self.width, self.height)));
            }
            if self.flushing {
                return Ok(None);
            }

            match self.ictx.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() == self.stream_index {
                        // Undecodable packets are skipped
                        let _ = self.decoder.send_packet(&packet);
                    }
                }
                None => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                }
            }
        }
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous BGR buffer,
/// dropping the per-row stride padding.
fn extract_bgr_pixels(bgr: &Video, width: u32, height: u32) -> Vec<u8> {
    let stride = bgr.stride(0);
    let data = bgr.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_video(path: &Path, num_frames: usize, width: u32, height: u32, fps: i32) {
        ffmpeg_next::init().unwrap();

        let mut octx = ffmpeg_next::format::output(path).unwrap();
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        ost.set_parameters(&encoder);
        octx.write_header().unwrap();
        let ost_time_base = octx.stream(0).unwrap().time_base();

        let mut scaler = scaling::Context::get(
            Pixel::BGR24,
            width,
            height,
            Pixel::YUV420P,
            width,
            height,
            scaling::Flags::BILINEAR,
        )
        .unwrap();

        for i in 0..num_frames {
            let mut bgr_frame = Video::new(Pixel::BGR24, width, height);
            let stride = bgr_frame.stride(0);
            let data = bgr_frame.data_mut(0);
            let value = ((i * 40) % 256) as u8;
            for row in 0..height as usize {
                for col in 0..width as usize {
                    let offset = row * stride + col * 3;
                    data[offset..offset + 3].copy_from_slice(&[value, value, value]);
                }
            }

            let mut yuv_frame = Video::empty();
            scaler.run(&bgr_frame, &mut yuv_frame).unwrap();
            yuv_frame.set_pts(Some(i as i64));
            encoder.send_frame(&yuv_frame).unwrap();

            let mut encoded = ffmpeg_next::Packet::empty();
            while encoder.receive_packet(&mut encoded).is_ok() {
                encoded.set_stream(0);
                encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
                encoded.write_interleaved(&mut octx).unwrap();
            }
        }

        encoder.send_eof().unwrap();
        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
            encoded.write_interleaved(&mut octx).unwrap();
        }
        octx.write_trailer().unwrap();
    }

    fn opened_source(num_frames: usize) -> (tempfile::TempDir, FfmpegSource) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eye.mp4");
        create_test_video(&path, num_frames, 160, 120, 30);
        let mut source = FfmpegSource::new();
        source.open(&path).unwrap();
        (dir, source)
    }

    #[test]
    fn test_open_returns_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eye.mp4");
        create_test_video(&path, 5, 160, 120, 30);

        let mut source = FfmpegSource::new();
        let meta = source.open(&path).unwrap();
        assert_eq!(meta.width, 160);
        assert_eq!(meta.height, 120);
        assert!(meta.fps > 0.0);
        assert_eq!(meta.source_path, Some(path));
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn test_open_nonexistent_is_open_error() {
        let mut source = FfmpegSource::new();
        let result = source.open(Path::new("/nonexistent/eye.mp4"));
        assert!(matches!(result, Err(SourceError::Open { .. })));
    }

    #[test]
    fn test_read_before_open_is_no_source() {
        let mut source = FfmpegSource::new();
        assert!(matches!(source.read_next(), Err(SourceError::NoSource)));
        assert!(matches!(source.seek(0), Err(SourceError::NoSource)));
    }

    #[test]
    fn test_reads_sequential_bgr_frames() {
        let (_dir, mut source) = opened_source(5);
        for i in 0..5 {
            let frame = source.read_next().unwrap();
            assert_eq!(frame.index(), i);
            assert_eq!(frame.channels(), 3);
            assert_eq!(frame.data().len(), 160 * 120 * 3);
        }
    }

    #[test]
    fn test_end_of_stream_rewinds_to_first_frame() {
        let (_dir, mut source) = opened_source(5);
        for _ in 0..5 {
            source.read_next().unwrap();
        }
        assert!(matches!(source.read_next(), Err(SourceError::EndOfStream)));
        assert_eq!(source.position(), 0);
        assert_eq!(source.read_next().unwrap().index(), 0);
    }

    #[test]
    fn test_seek_positions_next_read() {
        let (_dir, mut source) = opened_source(5);
        source.read_next().unwrap();
        source.seek(3).unwrap();
        assert_eq!(source.position(), 3);
        assert_eq!(source.read_next().unwrap().index(), 3);

        source.seek(0).unwrap();
        assert_eq!(source.read_next().unwrap().index(), 0);
    }

    #[test]
    fn test_seek_past_end_rewinds() {
        let (_dir, mut source) = opened_source(3);
        assert!(matches!(source.seek(10), Err(SourceError::EndOfStream)));
        assert_eq!(source.position(), 0);
    }
}
