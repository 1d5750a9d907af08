/// Axis-aligned region of interest in full-frame pixel coordinates.
///
/// Stored as `(top_left, bottom_right)` corners. Corners may lie outside the
/// frame: a tracked ROI keeps its exact size even when the shape it follows
/// sits near an edge, and is only clipped when pixels are actually read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roi {
    pub top_left: (i32, i32),
    pub bottom_right: (i32, i32),
}

/// In-bounds pixel rectangle, used to pass clipped crop coordinates without
/// many arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Roi {
    pub fn new(top_left: (i32, i32), bottom_right: (i32, i32)) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// Square of side `size` centered on `(cx, cy)`. An odd side puts the
    /// extra pixel on the bottom-right.
    pub fn centered_square(cx: i32, cy: i32, size: i32) -> Self {
        let top_left = (cx - size / 2, cy - size / 2);
        Self::new(top_left, (top_left.0 + size, top_left.1 + size))
    }

    pub fn width(&self) -> i32 {
        self.bottom_right.0 - self.top_left.0
    }

    pub fn height(&self) -> i32 {
        self.bottom_right.1 - self.top_left.1
    }

    /// Strict containment: points on the border are outside.
    pub fn contains_strict(&self, x: i32, y: i32) -> bool {
        self.top_left.0 < x
            && x < self.bottom_right.0
            && self.top_left.1 < y
            && y < self.bottom_right.1
    }

    /// Intersects the ROI with a `width`×`height` frame.
    ///
    /// Returns `None` when nothing of the ROI is visible.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<PixelRect> {
        let x1 = self.top_left.0.clamp(0, width as i32);
        let y1 = self.top_left.1.clamp(0, height as i32);
        let x2 = self.bottom_right.0.clamp(0, width as i32);
        let y2 = self.bottom_right.1.clamp(0, height as i32);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(PixelRect {
            x: x1 as usize,
            y: y1 as usize,
            w: (x2 - x1) as usize,
            h: (y2 - y1) as usize,
        })
    }
}
