use crate::shared::frame::Frame;

/// Receives annotated frames for presentation, once per playback tick.
pub trait DisplaySurface {
    fn present(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
