use std::path::PathBuf;

use crossbeam_channel::{Receiver, Sender};

use super::candidate_cycler::CandidateCycler;
use super::player::{PlaybackError, Player};

/// Manual actions funneled through the session loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Open(PathBuf),
    Play,
    Stop,
    FindPupil,
    FindReflection,
    SelectPupil(usize),
    SelectReflection(usize),
    Clear,
    Shutdown,
}

/// Counters for one run of the session loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames: usize,
    pub pupil_tracked: usize,
    pub reflection_tracked: usize,
    pub reached_end: bool,
}

/// Single consumer for timer ticks and manual commands.
///
/// Both arrive on channels and are handled one at a time on the thread
/// that calls [`run`](Self::run), so a tick never interleaves with a
/// candidate selection.
pub struct Session {
    player: Player,
    cycler: CandidateCycler,
    exit_at_end: bool,
}

impl Session {
    pub fn new(player: Player, cycler: CandidateCycler) -> Self {
        Self {
            player,
            cycler,
            exit_at_end: false,
        }
    }

    /// Makes [`run`](Self::run) return once playback reaches end of stream.
    pub fn exit_at_end(mut self, exit: bool) -> Self {
        self.exit_at_end = exit;
        self
    }

    /// An unbounded command channel for feeding [`run`](Self::run).
    pub fn channel() -> (Sender<Command>, Receiver<Command>) {
        crossbeam_channel::unbounded()
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn cycler(&self) -> &CandidateCycler {
        &self.cycler
    }

    /// Applies one command synchronously.
    pub fn handle(&mut self, command: Command) -> Result<(), PlaybackError> {
        log::debug!("Command {command:?}");
        match command {
            Command::Open(path) => {
                self.cycler.reset_indices();
                self.player.open(&path)?;
            }
            Command::Play => {
                self.cycler.reset_indices();
                self.player.start();
            }
            Command::Stop => self.player.stop(),
            Command::FindPupil => {
                self.cycler.find_pupil(&mut self.player)?;
            }
            Command::FindReflection => {
                self.cycler.find_reflection(&mut self.player)?;
            }
            Command::SelectPupil(index) => {
                self.cycler.select_pupil(&mut self.player, index)?;
            }
            Command::SelectReflection(index) => {
                self.cycler.select_reflection(&mut self.player, index)?;
            }
            Command::Clear => self.cycler.clear(&mut self.player)?,
            Command::Shutdown => {}
        }
        Ok(())
    }

    /// Processes commands and, while playing, ticks at the player's cadence.
    ///
    /// Returns on `Shutdown`, at end of stream when configured to, or once
    /// every command sender is gone and playback has stopped. A failed
    /// command is logged and the loop continues; a failed tick other than
    /// end of stream or a missing source ends the run with that error.
    pub fn run(&mut self, commands: &Receiver<Command>) -> Result<SessionSummary, PlaybackError> {
        let mut summary = SessionSummary::default();
        let mut inbox = commands.clone();
        let mut ticker = crossbeam_channel::never();
        let mut ticking = false;
        let mut inbox_closed = false;

        loop {
            if self.player.is_running() != ticking {
                ticking = self.player.is_running();
                ticker = if ticking {
                    crossbeam_channel::tick(self.player.interval())
                } else {
                    crossbeam_channel::never()
                };
            }

            crossbeam_channel::select! {
                recv(inbox) -> msg => match msg {
                    Ok(Command::Shutdown) => break,
                    Ok(command) => {
                        if let Err(e) = self.handle(command) {
                            log::warn!("{e}");
                        }
                    }
                    Err(_) => inbox_closed = true,
                },
                recv(ticker) -> _ => match self.player.tick() {
                    Ok(Some(tracked)) => {
                        summary.frames += 1;
                        summary.pupil_tracked += usize::from(tracked.pupil.is_some());
                        summary.reflection_tracked += usize::from(tracked.reflection.is_some());
                    }
                    Ok(None) => {}
                    Err(e) if e.is_end_of_stream() => {
                        summary.reached_end = true;
                        if self.exit_at_end {
                            break;
                        }
                    }
                    Err(PlaybackError::Source(e)) => log::warn!("Playback stopped: {e}"),
                    Err(e) => return Err(e),
                },
            }

            if inbox_closed {
                // Disconnected receivers are always ready; stop polling it
                inbox = crossbeam_channel::never();
                if !self.player.is_running() {
                    break;
                }
            }
        }

        log::info!(
            "Session ended after {} frames (pupil tracked in {}, reflection in {})",
            summary.frames,
            summary.pupil_tracked,
            summary.reflection_tracked
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::candidate::TrackState;
    use crate::detection::infrastructure::pupil_tracker::PupilTracker;
    use crate::shared::frame::Frame;
    use crate::video::infrastructure::memory_source::MemorySource;
    use crate::video::infrastructure::null_display::NullDisplay;
    use std::path::Path;

    fn eye_clip(n: usize) -> Vec<Frame> {
        (0..n)
            .map(|i| {
                let mut frame = Frame::filled(320, 240, [150, 150, 150], i);
                {
                    let mut arr = frame.as_ndarray_mut();
                    for y in 0..240i32 {
                        for x in 0..320i32 {
                            if (x - 160).pow(2) + (y - 120).pow(2) <= 50 * 50 {
                                for ch in 0..3 {
                                    arr[[y as usize, x as usize, ch]] = 20;
                                }
                            }
                        }
                    }
                }
                frame
            })
            .collect()
    }

    fn build_session(frames: Vec<Frame>) -> Session {
        let player = Player::new(
            PupilTracker::default(),
            Box::new(MemorySource::new(frames, 30.0)),
            Box::new(NullDisplay::new()),
        )
        .with_fps(1000);
        Session::new(player, CandidateCycler::new(true))
    }

    #[test]
    fn test_plays_to_end_of_stream() {
        let mut session = build_session(eye_clip(6)).exit_at_end(true);
        let (tx, rx) = Session::channel();
        tx.send(Command::Open(PathBuf::from("clip"))).unwrap();
        tx.send(Command::FindPupil).unwrap();
        tx.send(Command::Play).unwrap();

        let summary = session.run(&rx).unwrap();
        assert!(summary.reached_end);
        assert_eq!(summary.frames, 6);
        assert_eq!(summary.pupil_tracked, 6);
        assert_eq!(session.player().position(), 0);
        assert!(!session.player().is_running());
        assert_eq!(
            session.player().tracker().pupil_state(),
            TrackState::Unconfirmed
        );
    }

    #[test]
    fn test_returns_when_senders_dropped_while_stopped() {
        let mut session = build_session(eye_clip(2));
        let (tx, rx) = Session::channel();
        tx.send(Command::Open(PathBuf::from("clip"))).unwrap();
        drop(tx);

        let summary = session.run(&rx).unwrap();
        assert_eq!(summary, SessionSummary::default());
        assert_eq!(session.player().frame_count(), 2);
    }

    #[test]
    fn test_failed_command_does_not_end_run() {
        let mut session = build_session(eye_clip(2));
        let (tx, rx) = Session::channel();
        // Nothing loaded yet
        tx.send(Command::FindPupil).unwrap();
        tx.send(Command::Open(PathBuf::from("clip"))).unwrap();
        tx.send(Command::FindPupil).unwrap();
        tx.send(Command::Shutdown).unwrap();

        session.run(&rx).unwrap();
        assert_eq!(session.cycler().pupil_index(), Some(0));
    }

    #[test]
    fn test_handle_play_and_stop() {
        let mut session = build_session(eye_clip(2));
        session.handle(Command::Open(PathBuf::from("clip"))).unwrap();
        session.handle(Command::SelectPupil(0)).unwrap();
        session.handle(Command::Play).unwrap();
        assert!(session.player().is_running());
        assert_eq!(session.cycler().pupil_index(), None);
        session.handle(Command::Stop).unwrap();
        assert!(!session.player().is_running());
    }

    #[test]
    fn test_clear_command() {
        let mut session = build_session(eye_clip(1));
        session.handle(Command::Open(PathBuf::from("clip"))).unwrap();
        session.handle(Command::FindPupil).unwrap();
        session.handle(Command::Clear).unwrap();
        assert_eq!(session.cycler().pupil_index(), None);
        assert_eq!(
            session.player().tracker().pupil_state(),
            TrackState::Unconfirmed
        );
    }

    #[test]
    fn test_open_missing_clip_is_reported() {
        let mut session = build_session(Vec::new());
        assert!(session.handle(Command::Open(Path::new("none").into())).is_err());
    }
}
