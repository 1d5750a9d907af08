use image::{ImageBuffer, Rgb};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_polygon_mut, draw_hollow_rect_mut, draw_line_segment_mut,
};
use imageproc::point::Point;
use imageproc::rect::Rect;

use crate::detection::domain::candidate::{PupilSelection, ReflectionSelection};
use crate::shared::constants::CENTROID_MARKER_RADIUS;
use crate::shared::frame::Frame;
use crate::shared::roi::Roi;

/// BGR color triple. The pixel type below is `Rgb` only because that is the
/// 3-channel type `imageproc` draws with; channels are written positionally.
pub type Bgr = [u8; 3];

pub const WHITE: Bgr = [255, 255, 255];
pub const GRAY: Bgr = [100, 100, 100];
pub const RED: Bgr = [0, 0, 255];
pub const GREEN: Bgr = [0, 255, 100];

/// Number of segments used to outline a fitted ellipse.
const ELLIPSE_SEGMENTS: usize = 72;

type Canvas<'a> = ImageBuffer<Rgb<u8>, &'a mut [u8]>;

fn canvas(frame: &mut Frame) -> Option<Canvas<'_>> {
    let (w, h) = (frame.width(), frame.height());
    if frame.channels() != 3 {
        return None;
    }
    ImageBuffer::from_raw(w, h, frame.data_mut())
}

/// Draws a selected pupil: centroid dot always; hull, ellipse and ROI guide
/// when `verbose`.
pub fn draw_pupil(frame: &mut Frame, selection: &PupilSelection, verbose: bool) {
    let channels = frame.channels();
    let Some(mut canvas) = canvas(frame) else {
        log::warn!("Cannot annotate frame with {channels} channels");
        return;
    };
    draw_filled_circle_mut(
        &mut canvas,
        selection.centroid,
        CENTROID_MARKER_RADIUS,
        Rgb(WHITE),
    );
    if verbose {
        let hull: Vec<Point<f32>> = selection
            .candidate
            .hull
            .points
            .iter()
            .map(|p| Point::new(p.x as f32, p.y as f32))
            .collect();
        draw_closed_polyline(&mut canvas, &hull, RED);

        let outline: Vec<Point<f32>> = selection
            .ellipse
            .boundary_points(ELLIPSE_SEGMENTS)
            .into_iter()
            .map(|(x, y)| Point::new(x as f32, y as f32))
            .collect();
        draw_closed_polyline(&mut canvas, &outline, GREEN);

        draw_roi(&mut canvas, &selection.roi, WHITE);
    }
}

/// Draws a selected reflection: centroid dot always; contour, rotated
/// rectangle and ROI guide when `verbose`.
pub fn draw_reflection(frame: &mut Frame, selection: &ReflectionSelection, verbose: bool) {
    let channels = frame.channels();
    let Some(mut canvas) = canvas(frame) else {
        log::warn!("Cannot annotate frame with {channels} channels");
        return;
    };
    draw_filled_circle_mut(
        &mut canvas,
        selection.centroid,
        CENTROID_MARKER_RADIUS,
        Rgb(GRAY),
    );
    if verbose {
        draw_roi(&mut canvas, &selection.roi, WHITE);

        let contour: Vec<Point<f32>> = selection
            .candidate
            .contour
            .points
            .iter()
            .map(|p| Point::new(p.x as f32, p.y as f32))
            .collect();
        draw_closed_polyline(&mut canvas, &contour, RED);

        let corners: Vec<Point<f32>> = selection
            .candidate
            .rect
            .corners()
            .iter()
            .map(|&(x, y)| Point::new(x.round() as f32, y.round() as f32))
            .collect();
        draw_closed_polyline(&mut canvas, &corners, GREEN);
    }
}

fn draw_roi(canvas: &mut Canvas<'_>, roi: &Roi, color: Bgr) {
    if roi.width() <= 0 || roi.height() <= 0 {
        return;
    }
    let rect = Rect::at(roi.top_left.0, roi.top_left.1)
        .of_size(roi.width() as u32 + 1, roi.height() as u32 + 1);
    draw_hollow_rect_mut(canvas, rect, Rgb(color));
}

fn draw_closed_polyline(canvas: &mut Canvas<'_>, points: &[Point<f32>], color: Bgr) {
    match points {
        [] => {}
        [p] => draw_line_segment_mut(canvas, (p.x, p.y), (p.x, p.y), Rgb(color)),
        _ => draw_hollow_polygon_mut(canvas, points, Rgb(color)),
    }
}
