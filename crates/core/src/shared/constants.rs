/// Side length of the square ROI kept around a confirmed pupil.
pub const PUPIL_ROI_SIZE: i32 = 200;

/// Side length of the square ROI kept around a confirmed reflection.
pub const REFLECTION_ROI_SIZE: i32 = 30;

/// Factor by which ingested frames are shrunk on both axes.
pub const DOWNSCALE_FACTOR: usize = 2;

/// Default playback cadence in frames per second.
pub const DEFAULT_FPS: u32 = 60;

/// Gaussian kernel size used in preprocessing.
pub const BLUR_KERNEL_SIZE: usize = 5;

/// Radius of the centroid marker drawn for a selected candidate.
pub const CENTROID_MARKER_RADIUS: i32 = 2;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "m4v", "webm"];
