// src/recorder.rs - Captures live poses into a playable dance move list
use crate::error::{ChallengeError, PlaylistError, Result};
use crate::pose::Pose;
use crate::sequencer::{DanceMove, Playlist};
use crate::session::PoseSource;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct PoseRecorder {
    moves: Vec<DanceMove>,
    skipped: usize,
}

impl PoseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the first live pose as a new move. Empty frames are skipped.
    pub fn capture(&mut self, live_poses: &[Pose]) -> bool {
        let Some(pose) = live_poses.first() else {
            self.skipped += 1;
            debug!("No pose in frame, nothing captured");
            return false;
        };

        let mut pose = pose.clone();
        pose.is_target = false;
        self.moves.push(DanceMove::from_pose(pose));
        true
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    pub fn skipped_frames(&self) -> usize {
        self.skipped
    }

    pub fn finish(self) -> std::result::Result<Playlist, PlaylistError> {
        info!("Recorded {} dance moves ({} empty frames skipped)", self.moves.len(), self.skipped);
        Playlist::new(self.moves)
    }
}

/// Samples `source` once per `interval` until `moves` poses have been captured.
pub async fn record_moves(
    mut source: impl PoseSource,
    moves: usize,
    interval: Duration,
) -> Result<Playlist> {
    let mut source = tokio::task::spawn_blocking(move || source.acquire().map(|()| source)).await??;

    let mut recorder = PoseRecorder::new();
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while recorder.move_count() < moves {
        ticker.tick().await;
        let poses = source.poll();
        if recorder.capture(&poses) {
            debug!("Captured move {}/{}", recorder.move_count(), moves);
        }
    }

    recorder.finish().map_err(ChallengeError::from)
}
