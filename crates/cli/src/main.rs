use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use pupil_tracker_core::detection::domain::tracker_config::TrackerConfig;
use pupil_tracker_core::detection::infrastructure::pupil_tracker::PupilTracker;
use pupil_tracker_core::playback::candidate_cycler::CandidateCycler;
use pupil_tracker_core::playback::player::Player;
use pupil_tracker_core::playback::session::{Command, Session};
use pupil_tracker_core::shared::constants::{DEFAULT_FPS, VIDEO_EXTENSIONS};
use pupil_tracker_core::video::domain::display_surface::DisplaySurface;
use pupil_tracker_core::video::infrastructure::ffmpeg_source::FfmpegSource;
use pupil_tracker_core::video::infrastructure::image_sequence_display::ImageSequenceDisplay;
use pupil_tracker_core::video::infrastructure::null_display::NullDisplay;

/// Pupil and corneal reflection tracking for eye videos.
#[derive(Parser)]
#[command(name = "pupil-track")]
struct Cli {
    /// Input eye video.
    video: PathBuf,

    /// Write annotated frames to this directory as numbered PNGs.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Playback cadence in frames per second.
    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: u32,

    /// JSON file with detection thresholds and ROI sizes.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pupil candidate to start tracking (wraps to 0 if out of range).
    #[arg(long, default_value = "0")]
    pupil_index: usize,

    /// Reflection candidate to start tracking; omit to track the pupil only.
    #[arg(long)]
    reflection_index: Option<usize>,

    /// Draw manual selections without candidate outlines.
    #[arg(long)]
    quiet: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = match &cli.config {
        Some(path) => TrackerConfig::from_json_file(path)?,
        None => TrackerConfig::default(),
    };
    let display = build_display(cli.output_dir.as_deref())?;
    let player = Player::new(
        PupilTracker::new(config),
        Box::new(FfmpegSource::new()),
        display,
    )
    .with_fps(cli.fps);

    let mut session = Session::new(player, CandidateCycler::new(!cli.quiet)).exit_at_end(true);
    session.handle(Command::Open(cli.video.clone()))?;
    session.handle(Command::SelectPupil(cli.pupil_index))?;
    if let Some(index) = cli.reflection_index {
        session.handle(Command::SelectReflection(index))?;
    }

    let (tx, rx) = Session::channel();
    tx.send(Command::Play)?;
    drop(tx);
    let summary = session.run(&rx)?;

    log::info!(
        "Tracked pupil in {}/{} frames, reflection in {}/{}",
        summary.pupil_tracked,
        summary.frames,
        summary.reflection_tracked,
        summary.frames
    );
    if let Some(dir) = &cli.output_dir {
        log::info!("Annotated frames written to {}", dir.display());
    }
    Ok(())
}

fn build_display(
    output_dir: Option<&Path>,
) -> Result<Box<dyn DisplaySurface>, Box<dyn std::error::Error>> {
    match output_dir {
        Some(dir) => Ok(Box::new(ImageSequenceDisplay::new(dir)?)),
        None => Ok(Box::new(NullDisplay::new())),
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.video.exists() {
        return Err(format!("Input file not found: {}", cli.video.display()).into());
    }
    if !is_video(&cli.video) {
        log::warn!(
            "{} does not have a known video extension, trying anyway",
            cli.video.display()
        );
    }
    if cli.fps == 0 {
        return Err("FPS must be a positive integer".into());
    }
    if let Some(config) = &cli.config {
        if !config.exists() {
            return Err(format!("Config file not found: {}", config.display()).into());
        }
    }
    if let Some(dir) = &cli.output_dir {
        if dir.is_file() {
            return Err(format!("Output directory is a file: {}", dir.display()).into());
        }
    }
    Ok(())
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
