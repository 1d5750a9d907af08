use crate::shared::frame::Frame;
use crate::video::domain::display_surface::DisplaySurface;

/// Discards frames. Used for headless runs.
#[derive(Debug, Default)]
pub struct NullDisplay;

impl NullDisplay {
    pub fn new() -> Self {
        Self
    }
}

impl DisplaySurface for NullDisplay {
    fn present(&mut self, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
