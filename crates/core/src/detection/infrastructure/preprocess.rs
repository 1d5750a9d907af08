use image::GrayImage;

use crate::shared::constants::BLUR_KERNEL_SIZE;
use crate::shared::frame::Frame;
use crate::shared::roi::Roi;

use super::gaussian;

/// Grayscale working image plus the full-frame position of its top-left pixel.
pub struct Preprocessed {
    pub gray: GrayImage,
    /// Translation from `gray` coordinates back to full-frame coordinates.
    pub offset: (i32, i32),
}

impl Preprocessed {
    pub fn is_empty(&self) -> bool {
        self.gray.width() == 0 || self.gray.height() == 0
    }
}

/// Crops `frame` to `roi` (whole frame when `None`), blurs with a 5×5
/// Gaussian and converts BGR to luma.
///
/// The ROI is clipped to the frame first, so the offset is the clipped
/// top-left. A ROI entirely outside the frame yields an empty image.
pub fn preprocess(frame: &Frame, roi: Option<Roi>) -> Preprocessed {
    let (mut pixels, offset) = match roi {
        None => (frame.clone(), (0, 0)),
        Some(r) => match r.clip_to(frame.width(), frame.height()) {
            Some(rect) => (frame.crop(rect), (rect.x as i32, rect.y as i32)),
            None => {
                return Preprocessed {
                    gray: GrayImage::new(0, 0),
                    offset: r.top_left,
                }
            }
        },
    };

    let (w, h, c) = (
        pixels.width() as usize,
        pixels.height() as usize,
        pixels.channels() as usize,
    );
    gaussian::separable_gaussian_blur(pixels.data_mut(), w, h, c, BLUR_KERNEL_SIZE);

    Preprocessed {
        gray: bgr_to_gray(&pixels),
        offset,
    }
}

/// Luma with Rec. 601 weights; channel order is B, G, R.
pub fn bgr_to_gray(frame: &Frame) -> GrayImage {
    let channels = frame.channels() as usize;
    let luma: Vec<u8> = frame
        .data()
        .chunks_exact(channels)
        .map(|px| {
            let (b, g, r) = (px[0] as f32, px[1] as f32, px[2] as f32);
            (0.114 * b + 0.587 * g + 0.299 * r).round().clamp(0.0, 255.0) as u8
        })
        .collect();
    GrayImage::from_raw(frame.width(), frame.height(), luma)
        .expect("luma buffer length must match frame dimensions")
}
