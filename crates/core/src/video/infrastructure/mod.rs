pub mod ffmpeg_source;
pub mod image_sequence_display;
pub mod memory_source;
pub mod null_display;
